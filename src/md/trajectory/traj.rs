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

use super::traj_it::TrajIterator;
use super::{CreationSnafu, Interpolatable, InterpolationSnafu, TrajError, INTERPOLATION_SAMPLES};
use crate::linalg::allocator::Allocator;
use crate::linalg::DefaultAllocator;
use crate::time::{Duration, Epoch, TimeSeries};
use snafu::{ensure, ResultExt};
use std::fmt;

/// Store a trajectory of any State.
#[derive(Clone, PartialEq)]
pub struct Traj<S: Interpolatable>
where
    DefaultAllocator: Allocator<S::VecLength>,
{
    /// Optionally name this trajectory
    pub name: Option<String>,
    /// States in chronological order once finalized
    pub states: Vec<S>,
}

impl<S: Interpolatable> Traj<S>
where
    DefaultAllocator: Allocator<S::VecLength>,
{
    pub fn new() -> Self {
        Self {
            name: None,
            states: Vec::new(),
        }
    }

    /// Orders the states and removes the duplicate epochs, can be used to store the states out of order
    pub fn finalize(&mut self) -> Result<(), TrajError> {
        ensure!(
            !self.states.is_empty(),
            CreationSnafu {
                msg: "no states in trajectory".to_string()
            }
        );
        self.states.sort_by_key(|a| a.epoch());
        self.states.dedup_by(|a, b| a.epoch().eq(&b.epoch()));
        Ok(())
    }

    /// Evaluate the trajectory at this specific epoch.
    ///
    /// States stored at exactly this epoch are returned as is, any other epoch within the
    /// trajectory bounds is interpolated from the neighboring states.
    pub fn at(&self, epoch: Epoch) -> Result<S, TrajError> {
        let (first, last) = match (self.states.first(), self.states.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(TrajError::NoInterpolationData { epoch }),
        };
        if first.epoch() > epoch || last.epoch() < epoch {
            return Err(TrajError::NoInterpolationData { epoch });
        }
        match self
            .states
            .binary_search_by(|state| state.epoch().cmp(&epoch))
        {
            Ok(idx) => Ok(self.states[idx]),
            Err(idx) => {
                if idx == 0 || idx >= self.states.len() {
                    // The insertion point is at either end of the list, so we're out of bounds.
                    return Err(TrajError::NoInterpolationData { epoch });
                }
                let num_left = INTERPOLATION_SAMPLES / 2;

                // Ensure that we aren't fetching out of the window
                let mut first_idx = idx.saturating_sub(num_left);
                let last_idx = self.states.len().min(first_idx + INTERPOLATION_SAMPLES);

                // Check that we have enough samples
                if last_idx == self.states.len() {
                    first_idx = last_idx.saturating_sub(INTERPOLATION_SAMPLES);
                }

                self.states[idx]
                    .interpolate(epoch, &self.states[first_idx..last_idx])
                    .context(InterpolationSnafu)
            }
        }
    }

    /// Returns the first state in this trajectory, if any
    pub fn first(&self) -> Option<&S> {
        self.states.first()
    }

    /// Returns the last state in this trajectory, if any
    pub fn last(&self) -> Option<&S> {
        self.states.last()
    }

    /// Creates an iterator through the trajectory by the provided step size
    pub fn every(&self, step: Duration) -> TrajIterator<S> {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => self.every_between(step, first.epoch(), last.epoch()),
            // An empty time series
            _ => {
                let epoch = Epoch::from_tai_seconds(0.0);
                TrajIterator {
                    time_series: TimeSeries::exclusive(epoch, epoch, step),
                    traj: self,
                }
            }
        }
    }

    /// Creates an iterator through the trajectory by the provided step size between the provided bounds
    pub fn every_between(&self, step: Duration, start: Epoch, end: Epoch) -> TrajIterator<S> {
        TrajIterator {
            time_series: TimeSeries::inclusive(start, end, step),
            traj: self,
        }
    }
}

impl<S: Interpolatable> Default for Traj<S>
where
    DefaultAllocator: Allocator<S::VecLength>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Interpolatable> fmt::Display for Traj<S>
where
    DefaultAllocator: Allocator<S::VecLength>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.clone().unwrap_or_default();
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "Trajectory {name} from {} to {} ({}, {} states)",
                first.epoch(),
                last.epoch(),
                last.epoch() - first.epoch(),
                self.states.len()
            ),
            _ => write!(f, "Empty trajectory {name}"),
        }
    }
}

impl<S: Interpolatable> fmt::Debug for Traj<S>
where
    DefaultAllocator: Allocator<S::VecLength>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
