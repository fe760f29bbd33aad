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

use super::transform::inertial_orbit;
use super::{CovarScalar, Covariance, CovarianceAstroSnafu, CovarianceError, CovarianceFrame};
use crate::cosmic::{Orbit, OrbitType, PositionAngle};
use crate::linalg::Matrix6;
use crate::time::Duration;
use snafu::ResultExt;

/// Keplerian state transition matrix, in Keplerian mean elements, of an orbit of the provided SMA over `dt`.
///
/// Only the secular drift of the mean anomaly due to the semi-major axis is modeled:
/// dM/da = -3/2 sqrt(mu / a^5) dt.
pub fn keplerian_stm(mu_km3_s2: f64, sma_km: f64, dt: Duration) -> Matrix6<f64> {
    let mut stm = Matrix6::identity();
    stm[(5, 0)] = keplerian_drift_rate(mu_km3_s2, sma_km) * dt.to_seconds();
    stm
}

/// Derivative of the mean motion with respect to the semi-major axis, in rad/s/km
pub fn keplerian_drift_rate(mu_km3_s2: f64, sma_km: f64) -> f64 {
    -1.5 * (mu_km3_s2 / sma_km.powi(5)).sqrt()
}

impl<T: CovarScalar> Covariance<T> {
    /// Returns this covariance shifted in time by `dt` with a Keplerian model, in the same representation.
    ///
    /// Only the dominant effect (the uncertainty of the semi-major axis spreading along track) is modeled.
    /// This is an approximation valid for short durations and not a substitute for an STM propagation.
    pub fn shifted_by(&self, orbit: &Orbit, dt: Duration) -> Result<Self, CovarianceError> {
        self.check_representation()?;
        let pivot = inertial_orbit(orbit);
        let kep = match self.frame {
            CovarianceFrame::Local(_) => self.change_frame(&pivot, pivot.frame)?,
            CovarianceFrame::Frame(_) => self.change_frame(orbit, pivot.frame)?,
        }
        .change_type(&pivot, OrbitType::Keplerian, PositionAngle::Mean)?;

        let stm = keplerian_stm(pivot.frame.mu_km3_s2(), pivot.sma_km(), dt);
        let epoch = self.epoch + dt;
        let shifted_kep = kep.congruence(
            &stm,
            epoch,
            kep.frame,
            OrbitType::Keplerian,
            PositionAngle::Mean,
        );
        let shifted_orbit = pivot.at_epoch(epoch).context(CovarianceAstroSnafu)?;
        debug!("covariance shifted by {dt} to {epoch}");

        match self.frame {
            CovarianceFrame::Local(lof) => shifted_kep
                .change_type(&shifted_orbit, OrbitType::Cartesian, PositionAngle::True)?
                .change_local_frame(&shifted_orbit, lof),
            CovarianceFrame::Frame(frame) => {
                if frame.is_inertial() {
                    shifted_kep
                        .change_frame(&shifted_orbit, frame)?
                        .change_type(&shifted_orbit, self.orbit_type, self.angle)
                } else {
                    shifted_kep
                        .change_type(&shifted_orbit, OrbitType::Cartesian, PositionAngle::True)?
                        .change_frame(&shifted_orbit, frame)
                }
            }
        }
    }
}
