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

use super::{
    CovarScalar, Covariance, CovarianceAstroSnafu, CovarianceError, CovarianceFrame,
    IncompatibleRepresentationSnafu, TypeChangeInLocalFrameSnafu,
};
use crate::cosmic::{DerivativeOrder, Frame, LocalOrbitalFrame, Orbit, OrbitType, PositionAngle};
use crate::linalg::Matrix6;
use snafu::{ensure, ResultExt};

/// Returns the orbit expressed in an inertial frame: its own frame if inertial, else EME2000.
pub(crate) fn inertial_orbit(orbit: &Orbit) -> Orbit {
    if orbit.frame.is_inertial() {
        orbit.without_stm()
    } else {
        orbit.in_frame(&Frame::eme2000())
    }
}

/// Jacobian of the Cartesian state from one frame to another.
///
/// Between two inertial frames only the rotation is applied (the relative rotation rate of pseudo-inertial
/// frames is neglected). If either frame rotates, the rotation rate couples the position into the velocity.
fn frame_jacobian(from: &Frame, to: &Frame, orbit: &Orbit) -> Matrix6<f64> {
    let order = if from.is_inertial() && to.is_inertial() {
        DerivativeOrder::Position
    } else {
        DerivativeOrder::PositionVelocity
    };
    from.transform_to(to, orbit.epoch).jacobian(order)
}

impl<T: CovarScalar> Covariance<T> {
    fn warn_epoch(&self, orbit: &Orbit) {
        if orbit.epoch != self.epoch {
            warn!(
                "covariance at {} converted with an orbit at {}",
                self.epoch, orbit.epoch
            );
        }
    }

    /// Returns the Jacobian from the current representation to the Cartesian state in the inertial frame of `pivot`.
    fn jacobian_to_inertial_cartesian(&self, pivot: &Orbit) -> Result<Matrix6<f64>, CovarianceError> {
        match self.frame {
            CovarianceFrame::Local(lof) => {
                let xf = lof
                    .transform_from_inertial(pivot)
                    .context(CovarianceAstroSnafu)?;
                Ok(xf.inverse().jacobian(DerivativeOrder::PositionVelocity))
            }
            CovarianceFrame::Frame(frame) => {
                let orbit_src = pivot.in_frame(&frame);
                let to_cart = orbit_src
                    .cartesian_jacobian_wrt(self.orbit_type, self.angle)
                    .context(CovarianceAstroSnafu)?;
                Ok(frame_jacobian(&frame, &pivot.frame, pivot) * to_cart)
            }
        }
    }

    /// Returns this covariance expressed in another frame, keeping its orbit type and position angle.
    ///
    /// The orbit is only used for its state, it may be in any frame.
    ///
    /// # Algorithm
    /// + Identical frames: returns a copy.
    /// + Both frames inertial: the rotation between the frames is applied to the position and velocity blocks,
    ///   and non-Cartesian covariances go through their Cartesian representation in each frame.
    /// + Either frame rotating: the covariance must be Cartesian and the Jacobian includes the rotation rate.
    /// + From a local orbital frame: the result is Cartesian in the requested frame.
    pub fn change_frame(&self, orbit: &Orbit, frame: Frame) -> Result<Self, CovarianceError> {
        self.check_representation()?;
        self.warn_epoch(orbit);
        match self.frame {
            CovarianceFrame::Frame(src) => {
                if src == frame {
                    return Ok(*self);
                }
                if !(src.is_inertial() && frame.is_inertial()) {
                    ensure!(
                        self.orbit_type == OrbitType::Cartesian,
                        IncompatibleRepresentationSnafu {
                            orbit_type: self.orbit_type,
                            frame: if src.is_inertial() { frame.name } else { src.name }
                        }
                    );
                }
                let orbit_src = orbit.in_frame(&src);
                let orbit_dst = orbit.in_frame(&frame);
                let to_cart = orbit_src
                    .cartesian_jacobian_wrt(self.orbit_type, self.angle)
                    .context(CovarianceAstroSnafu)?;
                let from_cart = orbit_dst
                    .jacobian_wrt_cartesian(self.orbit_type, self.angle)
                    .context(CovarianceAstroSnafu)?;
                let jac = from_cart * frame_jacobian(&src, &frame, orbit) * to_cart;
                debug!("covariance {src} -> {frame} @ {}", self.epoch);
                Ok(self.congruence(
                    &jac,
                    self.epoch,
                    CovarianceFrame::Frame(frame),
                    self.orbit_type,
                    self.angle,
                ))
            }
            CovarianceFrame::Local(lof) => {
                let pivot = inertial_orbit(orbit);
                let jac = frame_jacobian(&pivot.frame, &frame, &pivot)
                    * self.jacobian_to_inertial_cartesian(&pivot)?;
                debug!("covariance {lof} -> {frame} @ {}", self.epoch);
                Ok(self.congruence(
                    &jac,
                    self.epoch,
                    CovarianceFrame::Frame(frame),
                    OrbitType::Cartesian,
                    PositionAngle::True,
                ))
            }
        }
    }

    /// Returns this covariance expressed in the local orbital frame of the orbit. The result is Cartesian.
    pub fn change_local_frame(
        &self,
        orbit: &Orbit,
        lof: LocalOrbitalFrame,
    ) -> Result<Self, CovarianceError> {
        self.check_representation()?;
        self.warn_epoch(orbit);
        if self.frame == CovarianceFrame::Local(lof) {
            return Ok(*self);
        }
        let pivot = inertial_orbit(orbit);
        let to_lof = lof
            .jacobian_from_inertial(&pivot)
            .context(CovarianceAstroSnafu)?;
        let jac = to_lof * self.jacobian_to_inertial_cartesian(&pivot)?;
        debug!("covariance {} -> {lof} @ {}", self.frame, self.epoch);
        Ok(self.congruence(
            &jac,
            self.epoch,
            CovarianceFrame::Local(lof),
            OrbitType::Cartesian,
            PositionAngle::True,
        ))
    }

    /// Returns this covariance with another orbit type and position angle, in the same frame.
    ///
    /// # Errors
    /// + Local orbital frame covariances cannot be converted to any type other than Cartesian.
    /// + Non-inertial frame covariances must be Cartesian and stay Cartesian.
    pub fn change_type(
        &self,
        orbit: &Orbit,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Result<Self, CovarianceError> {
        self.check_representation()?;
        self.warn_epoch(orbit);
        let angle = orbit_type.normalized_angle(angle);
        match self.frame {
            CovarianceFrame::Local(lof) => {
                ensure!(
                    orbit_type == OrbitType::Cartesian,
                    TypeChangeInLocalFrameSnafu { lof }
                );
                Ok(*self)
            }
            CovarianceFrame::Frame(frame) => {
                if orbit_type == self.orbit_type && angle == self.angle {
                    return Ok(*self);
                }
                ensure!(
                    frame.is_inertial(),
                    IncompatibleRepresentationSnafu {
                        orbit_type,
                        frame: frame.name
                    }
                );
                let jac = orbit
                    .in_frame(&frame)
                    .jacobian_of_type_change((self.orbit_type, self.angle), (orbit_type, angle))
                    .context(CovarianceAstroSnafu)?;
                debug!(
                    "covariance {} ({}) -> {orbit_type} ({angle}) @ {}",
                    self.orbit_type, self.angle, self.epoch
                );
                Ok(self.congruence(&jac, self.epoch, self.frame, orbit_type, angle))
            }
        }
    }
}
