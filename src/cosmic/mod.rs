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

use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, DimName, Matrix6, OVector};
use crate::time::{Duration, Epoch};
use snafu::Snafu;
use std::fmt;

/// A trait allowing for something to have an epoch
pub trait TimeTagged {
    /// Retrieve the Epoch
    fn epoch(&self) -> Epoch;
    /// Set the Epoch
    fn set_epoch(&mut self, epoch: Epoch);

    /// Shift this epoch by a duration (can be negative)
    fn shift_by(&mut self, duration: Duration) {
        self.set_epoch(self.epoch() + duration);
    }
}

/// A trait for propagated states.
/// `VecLength` is the size of the propagated vector, including the STM when it is enabled.
pub trait State: Copy + PartialEq + fmt::Display + Send + Sync + TimeTagged
where
    Self: Sized,
    DefaultAllocator: Allocator<Self::VecLength>,
{
    type VecLength: DimName;

    /// Return this state as a vector for the propagation
    fn to_vector(&self) -> OVector<f64, Self::VecLength>;

    /// Set this state from the propagated vector
    fn set(&mut self, epoch: Epoch, vector: &OVector<f64, Self::VecLength>);

    /// Return the state transition matrix from the start of the propagation until the epoch of this state.
    fn stm(&self) -> Result<Matrix6<f64>, AstroError>;

    /// Sets the STM to identity (and enables its propagation)
    fn reset_stm(&mut self);

    /// Unsets the STM for this state
    fn unset_stm(&mut self);
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AstroError {
    #[snafu(display("{action} requires an inertial frame but {frame} is rotating"))]
    NonInertialFrame {
        frame: &'static str,
        action: &'static str,
    },
    #[snafu(display("{action} is only defined for elliptical orbits (ecc = {ecc})"))]
    NotElliptical { ecc: f64, action: &'static str },
    #[snafu(display("Jacobian of {elements} with respect to Cartesian is singular"))]
    SingularJacobian { elements: String },
    #[snafu(display("math domain error: {msg}"))]
    MathDomain { msg: String },
    #[snafu(display("maximum iterations reached ({iter})"))]
    MaxIterReached { iter: usize },
    #[snafu(display("expected STM to be set"))]
    StateTransitionMatrixUnset,
}

// Re-Export frames
mod frames;
pub use self::frames::*;

mod rotations;
pub use self::rotations::*;

// Re-Export orbit
mod orbit;
pub use self::orbit::*;

mod orbitdual;
pub use self::orbitdual::*;

/// Orbital element sets and their Jacobians with respect to the Cartesian state.
pub mod elements;
pub use self::elements::{OrbitType, PositionAngle};

/// Local orbital frames (RIC/QSW, TNW, NTW, VNC, LVLH).
pub mod lof;
pub use self::lof::{LocalFrame, LocalOrbitalFrame};

/// Earth gravitational parameter used by GMAT, in km^3/s^2
pub const EARTH_GM_KM3_S2: f64 = 398_600.441_5;

/// Earth rotation rate, in radians per second, from the IERS conventions
pub const EARTH_ROTATION_RATE_RAD_S: f64 = 7.292_115_146_706_979e-5;
