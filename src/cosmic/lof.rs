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

use super::{AstroError, DerivativeOrder, FrameTransform, NonInertialFrameSnafu, Orbit};
use crate::linalg::{Matrix3, Matrix6, Vector3};
use crate::utils::tilde_matrix;
use enum_iterator::Sequence;
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

/// Kinds of local orbital frames, all built from the position and velocity of the reference orbit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Sequence)]
pub enum LocalFrame {
    /// Radial, In-track, Cross-track (also known as QSW or RTN)
    RIC,
    /// In-track (velocity), Normal (in plane), Cross-track (orbit normal)
    TNW,
    /// Normal (in plane), In-track (velocity), Cross-track (orbit normal)
    NTW,
    /// Velocity, Normal (orbit normal), Co-normal
    VNC,
    /// Local vertical local horizontal, CCSDS definition: Z points to the center, Y opposite to the orbit normal
    LVLH,
}

impl LocalFrame {
    /// Returns the unit axes of this local frame, expressed in the frame of the orbit, in the order of the frame's axes.
    pub fn axes(&self, orbit: &Orbit) -> [Vector3<f64>; 3] {
        let r_hat = orbit.radius() / orbit.rmag_km();
        let v_hat = orbit.velocity() / orbit.vmag_km_s();
        let h_hat = orbit.hvec() / orbit.hmag_km2_s();
        match self {
            LocalFrame::RIC => [r_hat, h_hat.cross(&r_hat), h_hat],
            LocalFrame::TNW => [v_hat, h_hat.cross(&v_hat), h_hat],
            LocalFrame::NTW => [v_hat.cross(&h_hat), v_hat, h_hat],
            LocalFrame::VNC => [v_hat, h_hat, v_hat.cross(&h_hat)],
            LocalFrame::LVLH => {
                let z = -r_hat;
                let y = -h_hat;
                [y.cross(&z), y, z]
            }
        }
    }

    /// Returns the DCM from the frame of the orbit to this local frame (rows are the local axes).
    pub fn dcm_from_orbit_frame(&self, orbit: &Orbit) -> Matrix3<f64> {
        let [x, y, z] = self.axes(orbit);
        Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()])
    }

    pub fn name(&self) -> &'static str {
        match self {
            LocalFrame::RIC => "RIC",
            LocalFrame::TNW => "TNW",
            LocalFrame::NTW => "NTW",
            LocalFrame::VNC => "VNC",
            LocalFrame::LVLH => "LVLH",
        }
    }
}

impl fmt::Display for LocalFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A local orbital frame, which may be considered inertial (frozen at the reference epoch, no transport theorem)
/// or rotating with the orbit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalOrbitalFrame {
    pub kind: LocalFrame,
    /// If true, the frame rotation rate is ignored when transforming velocities.
    pub inertial: bool,
}

impl LocalOrbitalFrame {
    /// A local frame which rotates with the orbit
    pub fn rotating(kind: LocalFrame) -> Self {
        Self {
            kind,
            inertial: false,
        }
    }

    /// A local frame whose rotation rate is ignored
    pub fn inertial(kind: LocalFrame) -> Self {
        Self {
            kind,
            inertial: true,
        }
    }

    /// Returns the rigid transform from the (inertial) frame of the orbit into this local frame at the orbit epoch.
    ///
    /// The local frame angular velocity is the orbital rate `h / r²` about the orbit normal.
    pub fn transform_from_inertial(&self, orbit: &Orbit) -> Result<FrameTransform, AstroError> {
        ensure!(
            orbit.frame.is_inertial(),
            NonInertialFrameSnafu {
                frame: orbit.frame.name,
                action: "local orbital frame construction"
            }
        );
        let rotation = self.kind.dcm_from_orbit_frame(orbit);
        let rotation_rate = if self.inertial {
            Matrix3::zeros()
        } else {
            let omega = orbit.hvec() / orbit.rmag_km().powi(2);
            -rotation * tilde_matrix(&omega)
        };
        Ok(FrameTransform {
            from: orbit.frame.name,
            to: self.kind.name(),
            epoch: orbit.epoch,
            rotation,
            rotation_rate,
        })
    }

    /// Returns the Jacobian of the Cartesian state in this local frame with respect to the Cartesian state in the
    /// (inertial) frame of the orbit.
    pub fn jacobian_from_inertial(&self, orbit: &Orbit) -> Result<Matrix6<f64>, AstroError> {
        Ok(self
            .transform_from_inertial(orbit)?
            .jacobian(DerivativeOrder::PositionVelocity))
    }
}

impl fmt::Display for LocalOrbitalFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.inertial {
            write!(f, "{} (inertial)", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}
