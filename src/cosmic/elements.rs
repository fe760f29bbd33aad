/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{AstroError, NonInertialFrameSnafu, Orbit, OrbitDual, SingularJacobianSnafu};
use crate::linalg::{Matrix6, Vector6};
use crate::utils::between_0_tau;
use enum_iterator::Sequence;
use serde_derive::{Deserialize, Serialize};
use snafu::{ensure, OptionExt};
use std::fmt;

/// Orbital element parameterization of a six dimensional state
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Sequence)]
pub enum OrbitType {
    /// Position and velocity [X, Y, Z, VX, VY, VZ]
    #[default]
    Cartesian,
    /// [a, e, i, ω, Ω, anomaly]
    Keplerian,
    /// Circular parameters [a, ex, ey, i, Ω, α], where α is the latitude argument
    Circular,
    /// Equinoctial parameters [a, ex, ey, hx, hy, L], where L is the longitude argument
    Equinoctial,
}

/// Kind of angle locating the spacecraft on its orbit (anomaly, latitude argument or longitude argument)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Sequence)]
pub enum PositionAngle {
    #[default]
    True,
    Mean,
    Eccentric,
}

impl fmt::Display for OrbitType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl fmt::Display for PositionAngle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl OrbitType {
    /// Returns the angle kind which is meaningful for this type: Cartesian states carry no position angle and are
    /// normalized to `True` so that two Cartesian descriptions always compare equal.
    pub fn normalized_angle(self, angle: PositionAngle) -> PositionAngle {
        match self {
            OrbitType::Cartesian => PositionAngle::True,
            _ => angle,
        }
    }
}

impl Orbit {
    fn check_element_frame(&self, orbit_type: OrbitType) -> Result<(), AstroError> {
        if orbit_type != OrbitType::Cartesian {
            ensure!(
                self.frame.is_inertial(),
                NonInertialFrameSnafu {
                    frame: self.frame.name,
                    action: "orbital elements"
                }
            );
        }
        Ok(())
    }

    /// Returns the requested element set of this orbit, angles in radians (wrapped to [0; 2π)) and distances in km.
    pub fn elements(
        &self,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Result<Vector6<f64>, AstroError> {
        self.check_element_frame(orbit_type)?;
        let partials = OrbitDual::from(*self).elements(orbit_type, angle)?;
        let mut elements = Vector6::from_fn(|i, _| partials[i].real());
        match orbit_type {
            OrbitType::Cartesian => {}
            OrbitType::Keplerian => {
                for i in 3..6 {
                    elements[i] = between_0_tau(elements[i]);
                }
            }
            OrbitType::Circular => {
                elements[4] = between_0_tau(elements[4]);
                elements[5] = between_0_tau(elements[5]);
            }
            OrbitType::Equinoctial => elements[5] = between_0_tau(elements[5]),
        }
        Ok(elements)
    }

    /// Returns the Jacobian of the requested element set with respect to the Cartesian state of this orbit,
    /// i.e. d(elements)/d(x, y, z, vx, vy, vz), with angles in radians.
    ///
    /// # Errors
    /// + The frame of this orbit must be inertial for any type other than Cartesian.
    /// + The orbit must be elliptical for any type other than Cartesian.
    pub fn jacobian_wrt_cartesian(
        &self,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Result<Matrix6<f64>, AstroError> {
        if orbit_type == OrbitType::Cartesian {
            return Ok(Matrix6::identity());
        }
        self.check_element_frame(orbit_type)?;
        let partials = OrbitDual::from(*self).elements(orbit_type, angle)?;
        let mut jac = Matrix6::zeros();
        for (i, element) in partials.iter().enumerate() {
            for (j, value) in element.gradient().iter().enumerate() {
                jac[(i, j)] = *value;
            }
        }
        Ok(jac)
    }

    /// Returns the Jacobian of the Cartesian state with respect to the requested element set, computed as the
    /// inverse of [`Orbit::jacobian_wrt_cartesian`].
    pub fn cartesian_jacobian_wrt(
        &self,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Result<Matrix6<f64>, AstroError> {
        if orbit_type == OrbitType::Cartesian {
            return Ok(Matrix6::identity());
        }
        self.jacobian_wrt_cartesian(orbit_type, angle)?
            .try_inverse()
            .with_context(|| SingularJacobianSnafu {
                elements: format!("{orbit_type} ({angle})"),
            })
    }

    /// Returns the Jacobian of the `to` element set with respect to the `from` element set at this orbit.
    pub fn jacobian_of_type_change(
        &self,
        from: (OrbitType, PositionAngle),
        to: (OrbitType, PositionAngle),
    ) -> Result<Matrix6<f64>, AstroError> {
        let from = (from.0, from.0.normalized_angle(from.1));
        let to = (to.0, to.0.normalized_angle(to.1));
        if from == to {
            return Ok(Matrix6::identity());
        }
        let d_cart_d_from = self.cartesian_jacobian_wrt(from.0, from.1)?;
        if to.0 == OrbitType::Cartesian {
            return Ok(d_cart_d_from);
        }
        Ok(self.jacobian_wrt_cartesian(to.0, to.1)? * d_cart_d_from)
    }
}
