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
use crate::linalg::{DefaultAllocator, Matrix6};
use crate::polyfit::{hermite_eval, hermite_eval_orders, InterpolationError};
use crate::time::Epoch;
use crate::{Orbit, State, TimeTagged};

/// Number of states used around the requested epoch when interpolating a trajectory
pub(crate) const INTERPOLATION_SAMPLES: usize = 9;

/// States that can be interpolated should implement this trait.
pub trait Interpolatable: State
where
    Self: Sized,
    DefaultAllocator: Allocator<Self::VecLength>,
{
    /// Interpolates a new state at the provided epoch given a slice of states.
    fn interpolate(self, epoch: Epoch, states: &[Self]) -> Result<Self, InterpolationError>;
}

impl Interpolatable for Orbit {
    /// Position and velocity use a Hermite interpolation, the velocity being the derivative of the position.
    /// The STM is interpolated entry by entry from its values only, and kept only if every state carries one.
    fn interpolate(self, epoch: Epoch, states: &[Self]) -> Result<Self, InterpolationError> {
        let ref_epoch = match states.first() {
            Some(state) => state.epoch(),
            None => return Err(InterpolationError::NoInterpolationData { what: "orbit" }),
        };
        // Offsets from the first state keep the abscissas well conditioned
        let ts: Vec<f64> = states
            .iter()
            .map(|state| (state.epoch() - ref_epoch).to_seconds())
            .collect();
        let t = (epoch - ref_epoch).to_seconds();

        let mut me = self;
        for axis in 0..3 {
            let pos: Vec<f64> = states.iter().map(|s| s.radius()[axis]).collect();
            let vel: Vec<f64> = states.iter().map(|s| s.velocity()[axis]).collect();
            let (r_km, v_km_s) = hermite_eval(&ts, &pos, &vel, t)?;
            match axis {
                0 => {
                    me.x_km = r_km;
                    me.vx_km_s = v_km_s;
                }
                1 => {
                    me.y_km = r_km;
                    me.vy_km_s = v_km_s;
                }
                _ => {
                    me.z_km = r_km;
                    me.vz_km_s = v_km_s;
                }
            }
        }

        let stms: Option<Vec<Matrix6<f64>>> = states.iter().map(|s| s.stm).collect();
        me.stm = match (self.stm, stms) {
            (Some(_), Some(stms)) => {
                let mut stm = Matrix6::zeros();
                for (idx, entry) in stm.iter_mut().enumerate() {
                    let values: Vec<f64> = stms.iter().map(|phi| phi[idx]).collect();
                    *entry = hermite_eval_orders(&ts, &[values.as_slice()], t)?.0;
                }
                Some(stm)
            }
            _ => None,
        };
        me.set_epoch(epoch);

        Ok(me)
    }
}
