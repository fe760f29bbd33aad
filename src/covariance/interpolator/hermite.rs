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
use crate::covariance::shift::keplerian_drift_rate;
use crate::covariance::transform::inertial_orbit;
use crate::covariance::{Covariance, CovarianceError, CovarianceInterpolationSnafu};
use crate::cosmic::{Orbit, OrbitType, PositionAngle};
use crate::linalg::{Matrix6, Vector3};
use crate::polyfit::{hermite_eval, hermite_eval_orders};
use crate::time::Epoch;
use snafu::ResultExt;

/// Interpolates covariances with Hermite polynomials on each entry of their equinoctial mean representation.
///
/// The time derivatives of each entry are those of the Keplerian model (the mean longitude drifts with the
/// semi-major axis), which is why the entries are interpolated in mean elements.
/// The reference orbit is the Hermite interpolation of the sample positions and velocities.
#[derive(Copy, Clone, Debug)]
pub struct KeplerianHermiteInterpolator {
    pub cfg: InterpolationCfg,
    pub output: CovarianceOutput,
}

impl KeplerianHermiteInterpolator {
    pub fn new(cfg: InterpolationCfg, output: CovarianceOutput) -> Self {
        Self { cfg, output }
    }

    /// Hermite interpolation of the positions, using the velocities as derivatives.
    fn interpolate_orbit(orbits: &[Orbit], epoch: Epoch) -> Result<Orbit, CovarianceError> {
        let t0 = orbits[0].epoch;
        let ts: Vec<f64> = orbits.iter().map(|o| (o.epoch - t0).to_seconds()).collect();
        let t = (epoch - t0).to_seconds();
        let mut radius = Vector3::zeros();
        let mut velocity = Vector3::zeros();
        for axis in 0..3 {
            let pos: Vec<f64> = orbits.iter().map(|o| o.radius()[axis]).collect();
            let vel: Vec<f64> = orbits.iter().map(|o| o.velocity()[axis]).collect();
            let (r, v) = hermite_eval(&ts, &pos, &vel, t).context(CovarianceInterpolationSnafu)?;
            radius[axis] = r;
            velocity[axis] = v;
        }
        Ok(Orbit::from_position_velocity(
            &radius,
            &velocity,
            epoch,
            orbits[0].frame,
        ))
    }
}

impl CovarianceInterpolator for KeplerianHermiteInterpolator {
    fn interpolate(
        &self,
        epoch: Epoch,
        samples: &[InterpolationSample],
    ) -> Result<(Orbit, Covariance), CovarianceError> {
        let window = select_window(
            epoch,
            samples,
            self.cfg.samples,
            self.cfg.extrapolation_threshold,
        )?;
        let frame = inertial_orbit(&window[0].0).frame;

        let mut orbits = Vec::with_capacity(window.len());
        let mut matrices = Vec::with_capacity(window.len());
        let mut drift_rates = Vec::with_capacity(window.len());
        for (orbit, covariance) in &window {
            let orbit = orbit.in_frame(&frame);
            let equinoctial = covariance
                .change_type(&orbit, OrbitType::Cartesian, PositionAngle::True)?
                .change_frame(&orbit, frame)?
                .change_type(&orbit, OrbitType::Equinoctial, PositionAngle::Mean)?;
            drift_rates.push(keplerian_drift_rate(frame.mu_km3_s2(), orbit.sma_km()));
            matrices.push(*equinoctial.matrix());
            orbits.push(orbit);
        }

        let t0 = orbits[0].epoch;
        let ts: Vec<f64> = orbits.iter().map(|o| (o.epoch - t0).to_seconds()).collect();
        let t = (epoch - t0).to_seconds();
        let orders = self.cfg.filter.orders();

        let mut interpolated = Matrix6::<f64>::zeros();
        for row in 0..6 {
            for col in row..6 {
                let values: Vec<f64> = matrices.iter().map(|m| m[(row, col)]).collect();
                // Time derivatives of P = Φ P0 Φ^T with Φ = I + k dt at the (5, 0) entry
                let first: Vec<f64> = matrices
                    .iter()
                    .zip(&drift_rates)
                    .map(|(m, k)| {
                        let mut d = 0.0;
                        if row == 5 {
                            d += k * m[(0, col)];
                        }
                        if col == 5 {
                            d += k * m[(row, 0)];
                        }
                        d
                    })
                    .collect();
                let second: Vec<f64> = matrices
                    .iter()
                    .zip(&drift_rates)
                    .map(|(m, k)| {
                        if row == 5 && col == 5 {
                            2.0 * k * k * m[(0, 0)]
                        } else {
                            0.0
                        }
                    })
                    .collect();
                let all_orders = [values.as_slice(), first.as_slice(), second.as_slice()];
                let (value, _) = hermite_eval_orders(&ts, &all_orders[..orders], t)
                    .context(CovarianceInterpolationSnafu)?;
                interpolated[(row, col)] = value;
                interpolated[(col, row)] = value;
            }
        }

        let orbit = Self::interpolate_orbit(&orbits, epoch)?;
        let covariance = Covariance::new(
            interpolated,
            epoch,
            frame,
            OrbitType::Equinoctial,
            PositionAngle::Mean,
        );
        debug!(
            "interpolated covariance at {epoch} from {} samples ({:?})",
            window.len(),
            self.cfg.filter
        );
        Ok((orbit, self.output.express(&covariance, &orbit)?))
    }
}
