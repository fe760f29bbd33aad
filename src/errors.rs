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

use crate::cosmic::AstroError;
use crate::covariance::CovarianceError;
use crate::dynamics::DynamicsError;
use crate::io::ConfigError;
use crate::md::trajectory::TrajError;
use crate::polyfit::InterpolationError;
use crate::propagators::PropagationError;
use snafu::Snafu;

/// Any error of this crate, for callers which do not need to match on a specific module's error.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum NyxError {
    #[snafu(display("astrodynamics error: {source}"))]
    Astro { source: AstroError },
    #[snafu(display("covariance error: {source}"))]
    CovarianceFailure { source: CovarianceError },
    #[snafu(display("interpolation error: {source}"))]
    InterpolationFailure { source: InterpolationError },
    #[snafu(display("dynamics error: {source}"))]
    DynamicsFailure { source: DynamicsError },
    #[snafu(display("propagation error: {source}"))]
    PropagationFailure { source: PropagationError },
    #[snafu(display("trajectory error: {source}"))]
    Trajectory { source: TrajError },
    #[snafu(display("configuration error: {source}"))]
    Config { source: ConfigError },
}

macro_rules! from_source {
    ($err:ty, $variant:ident) => {
        impl From<$err> for NyxError {
            fn from(source: $err) -> Self {
                NyxError::$variant { source }
            }
        }
    };
}

from_source!(AstroError, Astro);
from_source!(CovarianceError, CovarianceFailure);
from_source!(InterpolationError, InterpolationFailure);
from_source!(DynamicsError, DynamicsFailure);
from_source!(PropagationError, PropagationFailure);
from_source!(TrajError, Trajectory);
from_source!(ConfigError, Config);
