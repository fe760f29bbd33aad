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

use super::{select_window, CovarianceInterpolator, CovarianceOutput, InterpolationCfg, InterpolationSample};
use crate::covariance::transform::inertial_orbit;
use crate::covariance::{Covariance, CovarianceAstroSnafu, CovarianceError};
use crate::cosmic::{LocalFrame, LocalOrbitalFrame, Orbit};
use crate::linalg::Matrix6;
use crate::time::Epoch;
use snafu::ResultExt;

/// Cubic smooth step, zero slope at both ends.
pub(crate) fn smooth_step(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blends two orbits: each is propagated to the epoch with two body dynamics and their Cartesian states
/// are mixed with a smooth step weight, so that the result matches each orbit at its own epoch.
#[derive(Copy, Clone, Debug, Default)]
pub struct OrbitBlender;

impl OrbitBlender {
    /// Returns the blending weight of the second orbit and the blended orbit, in the (inertial) frame of the first one.
    pub fn blend(
        &self,
        previous: &Orbit,
        next: &Orbit,
        epoch: Epoch,
    ) -> Result<(f64, Orbit), CovarianceError> {
        let previous = inertial_orbit(previous);
        let next = next.in_frame(&previous.frame);
        let span = (next.epoch - previous.epoch).to_seconds();
        let weight = smooth_step((epoch - previous.epoch).to_seconds() / span);
        let from_previous = previous.at_epoch(epoch).context(CovarianceAstroSnafu)?;
        let from_next = next.at_epoch(epoch).context(CovarianceAstroSnafu)?;
        let blended = from_previous.to_cartesian_vec() * (1.0 - weight)
            + from_next.to_cartesian_vec() * weight;
        Ok((
            weight,
            Orbit::cartesian_vec(&blended, epoch, previous.frame),
        ))
    }
}

/// Blends the two covariances surrounding the epoch.
///
/// Each is shifted to the epoch with the Keplerian model and expressed in the local orbital frame of its
/// shifted orbit. Both are blended with the weight of the [`OrbitBlender`] and the result is attached to the
/// local orbital frame of the blended orbit.
#[derive(Copy, Clone, Debug)]
pub struct CovarianceBlender {
    pub cfg: InterpolationCfg,
    /// Local orbital frame in which the covariances are blended
    pub lof: LocalOrbitalFrame,
    pub output: CovarianceOutput,
}

impl CovarianceBlender {
    /// Blends in the RIC frame. The number of samples of the configuration is ignored since blending uses two samples.
    pub fn new(cfg: InterpolationCfg, output: CovarianceOutput) -> Self {
        Self {
            cfg,
            lof: LocalOrbitalFrame::rotating(LocalFrame::RIC),
            output,
        }
    }

    pub fn with_local_frame(mut self, lof: LocalOrbitalFrame) -> Self {
        self.lof = lof;
        self
    }
}

impl CovarianceInterpolator for CovarianceBlender {
    fn interpolate(
        &self,
        epoch: Epoch,
        samples: &[InterpolationSample],
    ) -> Result<(Orbit, Covariance), CovarianceError> {
        let window = select_window(epoch, samples, 2, self.cfg.extrapolation_threshold)?;
        let (previous_orbit, previous_cov) = window[0];
        let (next_orbit, next_cov) = window[1];

        let (weight, orbit) = OrbitBlender.blend(&previous_orbit, &next_orbit, epoch)?;

        let mut blended = Matrix6::<f64>::zeros();
        for (sample_orbit, sample_cov, sample_weight) in [
            (previous_orbit, previous_cov, 1.0 - weight),
            (next_orbit, next_cov, weight),
        ] {
            let dt = epoch - sample_orbit.epoch;
            let shifted_orbit = inertial_orbit(&sample_orbit)
                .at_epoch(epoch)
                .context(CovarianceAstroSnafu)?;
            let local = sample_cov
                .shifted_by(&sample_orbit, dt)?
                .change_local_frame(&shifted_orbit, self.lof)?;
            blended += local.matrix() * sample_weight;
        }

        let covariance = Covariance::in_local_frame(blended, epoch, self.lof);
        debug!("blended covariances at {epoch} with weight {weight}");
        Ok((orbit, self.output.express(&covariance, &orbit)?))
    }
}
