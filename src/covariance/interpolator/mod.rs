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
    Covariance, CovarianceError, ExtrapolationBeyondThresholdSnafu, InsufficientSamplesSnafu,
    NonIncreasingEpochsSnafu,
};
use crate::cosmic::{Frame, LocalOrbitalFrame, Orbit, OrbitType, PositionAngle};
use crate::io::{duration_from_str, duration_to_str, ConfigError, ConfigRepr};
use crate::linalg::Vector3;
use crate::time::{Duration, Epoch};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use typed_builder::TypedBuilder;

mod blender;
mod hermite;

pub use blender::{CovarianceBlender, OrbitBlender};
pub use hermite::KeplerianHermiteInterpolator;

/// Message of the error raised when orbit and absolute position-velocity samples are mixed.
pub const MIXED_STATES_MSG: &str =
    "one state is defined using an orbit while the other is defined using an absolute position-velocity-acceleration";

/// Message of the error raised when only absolute position-velocity samples are provided.
pub const NO_PV_INTERPOLATOR_MSG: &str =
    "no interpolator defined for states defined by absolute position-velocity";

/// A state defined by its absolute position, velocity and acceleration, without any orbit attached.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AbsolutePv {
    pub epoch: Epoch,
    pub frame: Frame,
    pub position_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
    pub acceleration_km_s2: Vector3<f64>,
}

/// State of a tabulated covariance
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SampleState {
    Orbit(Orbit),
    AbsolutePv(AbsolutePv),
}

impl SampleState {
    pub fn epoch(&self) -> Epoch {
        match self {
            Self::Orbit(orbit) => orbit.epoch,
            Self::AbsolutePv(pv) => pv.epoch,
        }
    }
}

/// A tabulated covariance and the state it was computed for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InterpolationSample {
    pub state: SampleState,
    pub covariance: Covariance,
}

impl InterpolationSample {
    pub fn new(orbit: Orbit, covariance: Covariance) -> Self {
        Self {
            state: SampleState::Orbit(orbit),
            covariance,
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.state.epoch()
    }
}

/// Derivatives of the covariance entries used by the Hermite interpolation
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivativeFilter {
    /// Values only (Lagrange interpolation)
    Values,
    /// Values and first time derivatives
    #[default]
    FirstDerivative,
    /// Values, first and second time derivatives
    SecondDerivative,
}

impl DerivativeFilter {
    /// Number of orders (values included) used per sample
    pub fn orders(&self) -> usize {
        match self {
            Self::Values => 1,
            Self::FirstDerivative => 2,
            Self::SecondDerivative => 3,
        }
    }
}

/// Configuration of the covariance interpolators
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct InterpolationCfg {
    /// Number of samples used by each interpolation
    #[builder(default = 2)]
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Samples can be extrapolated up to this duration before the first sample or after the last one
    #[builder(default = Duration::ZERO)]
    #[serde(
        default = "default_threshold",
        serialize_with = "duration_to_str",
        deserialize_with = "duration_from_str"
    )]
    pub extrapolation_threshold: Duration,
    #[builder(default)]
    #[serde(default)]
    pub filter: DerivativeFilter,
}

fn default_samples() -> usize {
    2
}

fn default_threshold() -> Duration {
    Duration::ZERO
}

impl Default for InterpolationCfg {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for InterpolationCfg {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.samples == 0 {
            return Err(ConfigError::InvalidConfig {
                msg: "interpolation requires at least one sample".to_string(),
            });
        }
        if self.extrapolation_threshold < Duration::ZERO {
            return Err(ConfigError::InvalidConfig {
                msg: format!(
                    "extrapolation threshold must be positive, got {}",
                    self.extrapolation_threshold
                ),
            });
        }
        Ok(())
    }
}

/// Representation of the interpolated covariances
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CovarianceOutput {
    Frame {
        frame: Frame,
        orbit_type: OrbitType,
        angle: PositionAngle,
    },
    Local(LocalOrbitalFrame),
}

impl CovarianceOutput {
    /// Cartesian covariances in the provided frame
    pub fn cartesian(frame: Frame) -> Self {
        Self::Frame {
            frame,
            orbit_type: OrbitType::Cartesian,
            angle: PositionAngle::True,
        }
    }

    /// Expresses the covariance in this output representation
    pub(crate) fn express(
        &self,
        covariance: &Covariance,
        orbit: &Orbit,
    ) -> Result<Covariance, CovarianceError> {
        match *self {
            Self::Local(lof) => covariance.change_local_frame(orbit, lof),
            Self::Frame {
                frame,
                orbit_type,
                angle,
            } => covariance
                .change_type(orbit, OrbitType::Cartesian, PositionAngle::True)?
                .change_frame(orbit, frame)?
                .change_type(orbit, orbit_type, angle),
        }
    }
}

/// Interpolates tabulated covariances at any epoch within (or close to) the samples.
pub trait CovarianceInterpolator {
    /// Returns the interpolated orbit and covariance at the requested epoch.
    ///
    /// # Errors
    /// + Not enough samples, or samples not strictly increasing in time.
    /// + Samples mixing orbits and absolute position-velocity states, or only absolute position-velocity states.
    /// + Epoch further from the samples than the extrapolation threshold.
    fn interpolate(
        &self,
        epoch: Epoch,
        samples: &[InterpolationSample],
    ) -> Result<(Orbit, Covariance), CovarianceError>;
}

/// Validates the samples and returns the orbits and covariances of the interpolation window around the epoch.
///
/// The window is the `count` samples centered on the latest sample before the epoch, shifted to remain
/// within the samples.
pub(crate) fn select_window(
    epoch: Epoch,
    samples: &[InterpolationSample],
    count: usize,
    threshold: Duration,
) -> Result<Vec<(Orbit, Covariance)>, CovarianceError> {
    ensure!(
        count > 0 && !samples.is_empty() && samples.len() >= count,
        InsufficientSamplesSnafu {
            count: samples.len(),
            needed: count.max(1)
        }
    );

    let orbits: Vec<(Orbit, Covariance)> = samples
        .iter()
        .filter_map(|sample| match sample.state {
            SampleState::Orbit(orbit) => Some((orbit, sample.covariance)),
            SampleState::AbsolutePv(_) => None,
        })
        .collect();
    if orbits.is_empty() {
        return Err(CovarianceError::MismatchedStateDefinitions {
            msg: NO_PV_INTERPOLATOR_MSG.to_string(),
        });
    } else if orbits.len() != samples.len() {
        return Err(CovarianceError::MismatchedStateDefinitions {
            msg: MIXED_STATES_MSG.to_string(),
        });
    }

    for pair in samples.windows(2) {
        ensure!(
            pair[1].epoch() > pair[0].epoch(),
            NonIncreasingEpochsSnafu {
                epoch: pair[1].epoch()
            }
        );
    }

    let first = samples[0].epoch();
    let last = samples[samples.len() - 1].epoch();
    if epoch < first || epoch > last {
        ensure!(
            epoch >= first - threshold && epoch <= last + threshold,
            ExtrapolationBeyondThresholdSnafu {
                epoch,
                first,
                last,
                threshold_s: threshold.to_seconds()
            }
        );
        warn!("extrapolating covariance at {epoch} from samples in [{first}; {last}]");
    }

    let latest_before = samples
        .iter()
        .rposition(|sample| sample.epoch() <= epoch)
        .unwrap_or(0);
    let start = latest_before
        .saturating_sub((count - 1) / 2)
        .min(samples.len() - count);

    Ok(orbits[start..start + count].to_vec())
}
