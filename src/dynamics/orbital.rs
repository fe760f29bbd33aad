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

use super::{Dynamics, DynamicsAstroSnafu, DynamicsError};
use crate::cosmic::{AstroError, Orbit, OrbitDual};
use crate::linalg::{Const, Matrix6, OVector, Vector3, Vector6};
use crate::TimeTagged;
use hyperdual::linalg::norm;
use hyperdual::{Float, OHyperdual};
use snafu::ResultExt;
use std::fmt;

/// Two body dynamics about the center of the orbit's frame.
///
/// When the propagated orbit has its STM enabled, the STM is integrated alongside the state with
/// the Jacobian of the equations of motion computed with hyperdual numbers.
#[derive(Clone, Debug, Default)]
pub struct OrbitalDynamics {}

impl OrbitalDynamics {
    /// Point mass dynamics of the frame's central body
    pub fn two_body() -> Self {
        Self {}
    }

    /// Returns the state derivative and its Jacobian with respect to the Cartesian state.
    pub fn dual_eom(&self, osc: &Orbit) -> (Vector6<f64>, Matrix6<f64>) {
        let dual = OrbitDual::from(*osc);
        let radius = dual.radius();
        let velocity = dual.velocity();

        let rmag = norm(&radius);
        let mu = OHyperdual::<f64, Const<7>>::from(-osc.frame.mu_km3_s2());
        let body_acceleration = radius * (mu / rmag.powi(3));

        let mut fx = Vector6::zeros();
        let mut grad = Matrix6::zeros();
        for i in 0..6 {
            let component = if i < 3 {
                velocity[i]
            } else {
                body_acceleration[i - 3]
            };
            fx[i] = component[0];
            for j in 1..7 {
                grad[(i, j - 1)] = component[j];
            }
        }
        (fx, grad)
    }
}

impl Dynamics for OrbitalDynamics {
    type StateType = Orbit;

    fn eom(
        &self,
        _delta_t_s: f64,
        state: &OVector<f64, Const<42>>,
        ctx: &Orbit,
    ) -> Result<OVector<f64, Const<42>>, DynamicsError> {
        let radius = Vector3::new(state[0], state[1], state[2]);
        let velocity = Vector3::new(state[3], state[4], state[5]);
        let rmag = radius.norm();
        if rmag <= f64::EPSILON {
            return Err(AstroError::MathDomain {
                msg: "two body dynamics evaluated at the center of the frame".to_string(),
            })
            .context(DynamicsAstroSnafu);
        }

        let mut d_x = OVector::<f64, Const<42>>::zeros();
        if ctx.stm.is_some() {
            // Two body dynamics are time invariant, so the epoch offset does not enter the model.
            let osc = Orbit::from_position_velocity(&radius, &velocity, ctx.epoch(), ctx.frame);
            let (fx, grad) = self.dual_eom(&osc);
            let stm = Matrix6::from_column_slice(&state.as_slice()[6..]);
            let stm_dt = grad * stm;
            for i in 0..6 {
                d_x[i] = fx[i];
            }
            for (idx, val) in stm_dt.as_slice().iter().enumerate() {
                d_x[idx + 6] = *val;
            }
        } else {
            let body_acceleration = (-ctx.frame.mu_km3_s2() / rmag.powi(3)) * radius;
            for i in 0..3 {
                d_x[i] = velocity[i];
                d_x[i + 3] = body_acceleration[i];
            }
        }
        Ok(d_x)
    }
}

impl fmt::Display for OrbitalDynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "two body dynamics")
    }
}
