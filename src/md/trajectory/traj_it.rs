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

use super::{Interpolatable, Traj};
use crate::linalg::allocator::Allocator;
use crate::linalg::DefaultAllocator;
use crate::time::TimeSeries;

/// Iterates through a trajectory at a fixed step, interpolating between the stored states.
pub struct TrajIterator<'a, S: Interpolatable>
where
    DefaultAllocator: Allocator<S::VecLength>,
{
    pub time_series: TimeSeries,
    pub traj: &'a Traj<S>,
}

impl<S: Interpolatable> Iterator for TrajIterator<'_, S>
where
    DefaultAllocator: Allocator<S::VecLength>,
{
    type Item = S;

    fn next(&mut self) -> Option<Self::Item> {
        let next_epoch = self.time_series.next()?;
        match self.traj.at(next_epoch) {
            Ok(item) => Some(item),
            Err(e) => {
                error!("{} while iterating through {}", e, self.traj);
                None
            }
        }
    }
}
