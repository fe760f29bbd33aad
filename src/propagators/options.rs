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

use std::fmt;

use crate::time::{Duration, Unit};

use super::{ErrorCtrl, InvalidOptionsSnafu, PropagationError, RSSCartesianStep};
use snafu::ensure;
use typed_builder::TypedBuilder;

/// PropOpts stores the integrator options: the step bounds, the tolerance and the number of attempts.
///
/// Step bounds and tolerance only matter to adaptive integrators. With `fixed_step` set, the
/// integrator only uses its higher order solution and takes steps of exactly `init_step`.
#[derive(Clone, Copy, Debug, TypedBuilder)]
#[builder(doc)]
pub struct PropOpts<E: ErrorCtrl> {
    #[builder(default_code = "60.0 * Unit::Second")]
    pub init_step: Duration,
    #[builder(default_code = "0.001 * Unit::Second")]
    pub min_step: Duration,
    #[builder(default_code = "2700.0 * Unit::Second")]
    pub max_step: Duration,
    #[builder(default = 1e-12)]
    pub tolerance: f64,
    #[builder(default = 50)]
    pub attempts: u8,
    #[builder(default = false)]
    pub fixed_step: bool,
    pub error_ctrl: E,
}

impl<E: ErrorCtrl> PropOpts<E> {
    /// Adaptive step options starting at the maximum step. The number of attempts is 50, as in GMAT.
    pub fn with_adaptive_step(
        min_step: Duration,
        max_step: Duration,
        tolerance: f64,
        error_ctrl: E,
    ) -> Self {
        Self {
            init_step: max_step,
            min_step,
            max_step,
            tolerance,
            attempts: 50,
            fixed_step: false,
            error_ctrl,
        }
    }

    pub fn with_adaptive_step_s(
        min_step: f64,
        max_step: f64,
        tolerance: f64,
        error_ctrl: E,
    ) -> Self {
        Self::with_adaptive_step(
            min_step * Unit::Second,
            max_step * Unit::Second,
            tolerance,
            error_ctrl,
        )
    }

    /// Set the maximum step size and lower the initial step to it if needed
    pub fn set_max_step(&mut self, max_step: Duration) {
        if self.init_step > max_step {
            self.init_step = max_step;
        }
        self.max_step = max_step;
    }

    /// Set the minimum step size and raise the initial step to it if needed
    pub fn set_min_step(&mut self, min_step: Duration) {
        if self.init_step < min_step {
            self.init_step = min_step;
        }
        self.min_step = min_step;
    }

    /// Checks that the step bounds and tolerance are usable.
    pub fn validate(&self) -> Result<(), PropagationError> {
        ensure!(
            self.init_step > Duration::ZERO,
            InvalidOptionsSnafu {
                msg: format!("initial step must be positive, got {}", self.init_step)
            }
        );
        ensure!(
            self.fixed_step || self.min_step <= self.max_step,
            InvalidOptionsSnafu {
                msg: format!(
                    "min step {} is greater than max step {}",
                    self.min_step, self.max_step
                )
            }
        );
        ensure!(
            self.fixed_step || self.tolerance > 0.0,
            InvalidOptionsSnafu {
                msg: format!("tolerance must be positive, got {}", self.tolerance)
            }
        );
        ensure!(
            self.attempts > 0,
            InvalidOptionsSnafu {
                msg: "at least one attempt is needed".to_string()
            }
        );
        Ok(())
    }
}

impl<E: ErrorCtrl> fmt::Display for PropOpts<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fixed_step {
            write!(f, "fixed step: {}", self.init_step)
        } else {
            write!(
                f,
                "min_step: {}, max_step: {}, tol: {:e}, attempts: {}",
                self.min_step, self.max_step, self.tolerance, self.attempts,
            )
        }
    }
}

impl PropOpts<RSSCartesianStep> {
    /// Fixed step options: the integrator ignores its error estimate.
    pub fn with_fixed_step(step: Duration) -> Self {
        Self {
            init_step: step,
            min_step: step,
            max_step: step,
            tolerance: 0.0,
            fixed_step: true,
            attempts: 1,
            error_ctrl: RSSCartesianStep {},
        }
    }

    pub fn with_fixed_step_s(step: f64) -> Self {
        Self::with_fixed_step(step * Unit::Second)
    }

    /// Default options with the provided tolerance
    pub fn with_tolerance(tolerance: f64) -> Self {
        let mut opts = Self::default();
        opts.tolerance = tolerance;
        opts
    }
}

impl Default for PropOpts<RSSCartesianStep> {
    /// GMAT defaults: 60 s initial step, steps bounded in [0.001 s, 2700 s], tolerance 1e-12.
    fn default() -> PropOpts<RSSCartesianStep> {
        Self::builder().error_ctrl(RSSCartesianStep {}).build()
    }
}
