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

use super::{EulerRotation, EARTH_GM_KM3_S2, EARTH_ROTATION_RATE_RAD_S};
use crate::linalg::{Matrix3, Matrix6, Vector3};
use crate::time::Epoch;
use crate::utils::{block_lower_triangular, r3, r3_dot};
use std::fmt;

/// Orientation of a frame with respect to the root inertial frame (e.g. EME2000).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Orientation {
    /// Pseudo-inertial frame: the axes do not rotate with respect to the root frame.
    Inertial {
        /// DCM such that `r_root = dcm_to_root * r_frame`
        dcm_to_root: Matrix3<f64>,
    },
    /// Frame spinning at a constant rate about the Z axis of its base (e.g. an Earth fixed frame).
    Rotating {
        /// DCM from the (inertial) base of the spin to the root frame
        base_to_root: Matrix3<f64>,
        reference_epoch: Epoch,
        angle_at_reference_rad: f64,
        rate_rad_s: f64,
    },
}

/// A reference frame: a name, the gravitational parameter of its center, and its orientation.
/// All frames are centered on the same body, so frame changes are pure rotations (with rate).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frame {
    pub name: &'static str,
    pub mu_km3_s2: f64,
    pub orientation: Orientation,
}

impl Frame {
    /// The root inertial frame, Earth centered
    pub fn eme2000() -> Self {
        Self::inertial("EME2000", EARTH_GM_KM3_S2, Matrix3::identity())
    }

    /// An Earth fixed frame spinning at the IERS Earth rotation rate, aligned with EME2000 at the J2000 reference epoch.
    /// Precession, nutation and polar motion are not modeled.
    pub fn earth_fixed() -> Self {
        Self::rotating(
            "Earth fixed",
            EARTH_GM_KM3_S2,
            Matrix3::identity(),
            Epoch::from_gregorian_utc_at_noon(2000, 1, 1),
            0.0,
            EARTH_ROTATION_RATE_RAD_S,
        )
    }

    /// Initializes a new pseudo inertial frame.
    pub fn inertial(name: &'static str, mu_km3_s2: f64, dcm_to_root: Matrix3<f64>) -> Self {
        Self {
            name,
            mu_km3_s2,
            orientation: Orientation::Inertial { dcm_to_root },
        }
    }

    /// Initializes a new pseudo inertial frame from a sequence of Euler rotations from the root frame to this frame.
    /// For example, `[R3(a), R1(b)]` builds the frame obtained by rotating the root frame by `a` about Z and then by `b` about the new X axis.
    pub fn from_euler(name: &'static str, mu_km3_s2: f64, rotations: &[EulerRotation]) -> Self {
        let root_to_frame = rotations
            .iter()
            .fold(Matrix3::identity(), |acc, rot| rot.dcm() * acc);
        Self::inertial(name, mu_km3_s2, root_to_frame.transpose())
    }

    /// Initializes a new frame rotating at a constant rate about the Z axis of its base.
    pub fn rotating(
        name: &'static str,
        mu_km3_s2: f64,
        base_to_root: Matrix3<f64>,
        reference_epoch: Epoch,
        angle_at_reference_rad: f64,
        rate_rad_s: f64,
    ) -> Self {
        Self {
            name,
            mu_km3_s2,
            orientation: Orientation::Rotating {
                base_to_root,
                reference_epoch,
                angle_at_reference_rad,
                rate_rad_s,
            },
        }
    }

    /// Returns whether this frame is pseudo-inertial
    pub fn is_inertial(&self) -> bool {
        matches!(self.orientation, Orientation::Inertial { .. })
    }

    /// Returns the gravitational parameter of the center of this frame
    pub fn mu_km3_s2(&self) -> f64 {
        self.mu_km3_s2
    }

    /// DCM from this frame to the root frame at the provided epoch, and its time derivative.
    pub fn dcm_to_root(&self, epoch: Epoch) -> (Matrix3<f64>, Matrix3<f64>) {
        match self.orientation {
            Orientation::Inertial { dcm_to_root } => (dcm_to_root, Matrix3::zeros()),
            Orientation::Rotating {
                base_to_root,
                reference_epoch,
                angle_at_reference_rad,
                rate_rad_s,
            } => {
                let angle = angle_at_reference_rad
                    + rate_rad_s * (epoch - reference_epoch).to_seconds();
                // r_frame = R3(angle) r_base
                (
                    base_to_root * r3(angle).transpose(),
                    base_to_root * r3_dot(angle, rate_rad_s).transpose(),
                )
            }
        }
    }

    /// Computes the transformation from this frame to the other frame at the provided epoch.
    pub fn transform_to(&self, to: &Frame, epoch: Epoch) -> FrameTransform {
        let (from_root, from_root_dot) = self.dcm_to_root(epoch);
        let (to_root, to_root_dot) = to.dcm_to_root(epoch);
        FrameTransform {
            from: self.name,
            to: to.name,
            epoch,
            rotation: to_root.transpose() * from_root,
            rotation_rate: to_root_dot.transpose() * from_root + to_root.transpose() * from_root_dot,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Which derivatives of the position a state Jacobian accounts for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivativeOrder {
    /// Rotation only: the velocity block is the same rotation as the position block.
    Position,
    /// Rotation and rotation rate (transport theorem).
    PositionVelocity,
}

/// A rigid rotation between two frames at a given epoch such that
/// `r_to = rotation * r_from` and `v_to = rotation * v_from + rotation_rate * r_from`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameTransform {
    pub from: &'static str,
    pub to: &'static str,
    pub epoch: Epoch,
    pub rotation: Matrix3<f64>,
    pub rotation_rate: Matrix3<f64>,
}

impl FrameTransform {
    /// Builds the 6x6 Jacobian of the Cartesian state in the destination frame with respect to the Cartesian state in the origin frame.
    pub fn jacobian(&self, order: DerivativeOrder) -> Matrix6<f64> {
        let rate = match order {
            DerivativeOrder::Position => Matrix3::zeros(),
            DerivativeOrder::PositionVelocity => self.rotation_rate,
        };
        block_lower_triangular(&self.rotation, &rate, &self.rotation)
    }

    /// Returns the inverse transformation, from the destination frame to the origin frame.
    pub fn inverse(&self) -> Self {
        let rot_t = self.rotation.transpose();
        Self {
            from: self.to,
            to: self.from,
            epoch: self.epoch,
            rotation: rot_t,
            rotation_rate: -rot_t * self.rotation_rate * rot_t,
        }
    }

    /// Composes this transform with the next one, i.e. `next ∘ self`.
    pub fn then(&self, next: &Self) -> Self {
        Self {
            from: self.from,
            to: next.to,
            epoch: self.epoch,
            rotation: next.rotation * self.rotation,
            rotation_rate: next.rotation_rate * self.rotation + next.rotation * self.rotation_rate,
        }
    }

    /// Returns true if this transform has a zero rotation rate.
    pub fn is_rotation_only(&self) -> bool {
        self.rotation_rate.amax() == 0.0
    }

    /// Applies this transform to a position and velocity.
    pub fn apply(&self, radius_km: &Vector3<f64>, velocity_km_s: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
        (
            self.rotation * radius_km,
            self.rotation * velocity_km_s + self.rotation_rate * radius_km,
        )
    }
}

impl fmt::Display for FrameTransform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {} @ {}", self.from, self.to, self.epoch)
    }
}
