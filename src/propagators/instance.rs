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

use super::error_ctrl::ErrorCtrl;
use super::{DynamicsSnafu, IntegrationDetails, PropagationError, Propagator, TrajectoryBuildSnafu};
use crate::dynamics::Dynamics;
use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, OVector};
use crate::md::trajectory::{Interpolatable, Traj};
use crate::time::{Duration, Epoch, Unit};
use crate::{State, TimeTagged};
use rayon::iter::ParallelBridge;
use rayon::prelude::ParallelIterator;
use snafu::ResultExt;
use std::sync::mpsc::{channel, Sender};
use std::time::Instant;

/// A propagation in progress: the current state, the propagator it uses and the details of the
/// previous integration step.
#[derive(Debug)]
pub struct PropInstance<'a, D: Dynamics, E: ErrorCtrl>
where
    DefaultAllocator: Allocator<<D::StateType as State>::VecLength>,
{
    /// The state of this propagator instance
    pub state: D::StateType,
    /// The propagator setup (kind, stages, etc.)
    pub prop: &'a Propagator<D, E>,
    /// Stores the details of the previous integration step
    pub details: IntegrationDetails,
    pub(crate) step_size: Duration, // Stores the adapted step for the _next_ call
    pub(crate) fixed_step: bool,
    // Allows us to do pre-allocation of the ki vectors
    pub(crate) k: Vec<OVector<f64, <D::StateType as State>::VecLength>>,
}

impl<'a, D: Dynamics, E: ErrorCtrl> PropInstance<'a, D, E>
where
    DefaultAllocator: Allocator<<D::StateType as State>::VecLength>,
{
    /// Allows setting the step size of the propagator
    pub fn set_step(&mut self, step_size: Duration, fixed: bool) {
        self.step_size = step_size;
        self.fixed_step = fixed;
    }

    fn for_duration_channel_option(
        &mut self,
        duration: Duration,
        maybe_tx_chan: Option<Sender<D::StateType>>,
    ) -> Result<D::StateType, PropagationError> {
        self.prop.opts.validate()?;
        if duration == Duration::ZERO {
            return Ok(self.state);
        }
        let stop_time = self.state.epoch() + duration;

        let tick = Instant::now();
        let log_progress = duration.abs() >= 2 * Unit::Minute;

        if log_progress {
            debug!("Propagating for {} until {}", duration, stop_time);
        }
        // Call `finally` on the current state to set anything up
        self.state = self.prop.dynamics.finally(self.state).context(DynamicsSnafu)?;

        let backprop = duration.is_negative();
        if backprop {
            self.step_size = -self.step_size; // Invert the step size
        }
        loop {
            let epoch = self.state.epoch();
            if (!backprop && epoch + self.step_size > stop_time)
                || (backprop && epoch + self.step_size <= stop_time)
            {
                if stop_time != epoch {
                    // Take one final step of exactly the needed duration until the stop time
                    let prev_step_size = self.step_size;
                    let prev_step_kind = self.fixed_step;
                    self.set_step(stop_time - epoch, true);

                    self.single_step()?;

                    if let Some(ref chan) = maybe_tx_chan {
                        if let Err(e) = chan.send(self.state) {
                            warn!("{} when sending on channel", e)
                        }
                    }

                    // Restore the step size for subsequent calls
                    self.set_step(prev_step_size, prev_step_kind);
                }

                if backprop {
                    self.step_size = -self.step_size; // Restore to a positive step size
                }

                if log_progress {
                    let tock: Duration = tick.elapsed().into();
                    debug!("Done in {}", tock);
                }

                return Ok(self.state);
            } else {
                self.single_step()?;
                if let Some(ref chan) = maybe_tx_chan {
                    if let Err(e) = chan.send(self.state) {
                        warn!("{} when sending on channel", e)
                    }
                }
            }
        }
    }

    /// This method propagates the provided Dynamics for the provided duration.
    pub fn for_duration(&mut self, duration: Duration) -> Result<D::StateType, PropagationError> {
        self.for_duration_channel_option(duration, None)
    }

    /// This method propagates the provided Dynamics for the provided duration and publishes each state on the channel.
    pub fn for_duration_with_channel(
        &mut self,
        duration: Duration,
        tx_chan: Sender<D::StateType>,
    ) -> Result<D::StateType, PropagationError> {
        self.for_duration_channel_option(duration, Some(tx_chan))
    }

    /// Propagates the provided Dynamics until the provided epoch. Returns the end state.
    pub fn until_epoch(&mut self, end_time: Epoch) -> Result<D::StateType, PropagationError> {
        let duration: Duration = end_time - self.state.epoch();
        self.for_duration(duration)
    }

    /// Propagates the provided Dynamics for the provided duration and collects every step into a trajectory.
    /// Returns the end state and the trajectory.
    pub fn for_duration_with_traj(
        &mut self,
        duration: Duration,
    ) -> Result<(D::StateType, Traj<D::StateType>), PropagationError>
    where
        D::StateType: Interpolatable,
    {
        let start_state = self.state;

        let (tx, rx) = channel();
        // The end state is also sent on the channel, and the sender is dropped on return.
        let end_state = self.for_duration_with_channel(duration, tx)?;

        let mut traj = Traj::new();
        traj.states = rx.into_iter().par_bridge().collect();
        // Push the start state, reordered in the finalize call.
        traj.states.push(start_state);
        traj.finalize().context(TrajectoryBuildSnafu)?;

        Ok((end_state, traj))
    }

    /// Propagates the provided Dynamics until the provided epoch and collects every step into a trajectory.
    pub fn until_epoch_with_traj(
        &mut self,
        end_time: Epoch,
    ) -> Result<(D::StateType, Traj<D::StateType>), PropagationError>
    where
        D::StateType: Interpolatable,
    {
        let duration: Duration = end_time - self.state.epoch();
        self.for_duration_with_traj(duration)
    }

    /// Take a single propagator step
    pub fn single_step(&mut self) -> Result<(), PropagationError> {
        let (t, state_vec) = self.derive()?;
        self.state.set(self.state.epoch() + t, &state_vec);
        self.state = self.prop.dynamics.finally(self.state).context(DynamicsSnafu)?;

        Ok(())
    }

    /// Runs one Runge Kutta step of the equations of motion. Everything passed to the dynamics is in **seconds**.
    ///
    /// Returns the step size used and the new state vector. Adaptive steps retry with a smaller step
    /// until the error estimate is below the tolerance, the minimum step is reached, or the attempts are exhausted.
    fn derive(
        &mut self,
    ) -> Result<(Duration, OVector<f64, <D::StateType as State>::VecLength>), PropagationError> {
        let state_vec = &self.state.to_vector();
        let state_ctx = &self.state;
        // Reset the number of attempts used (we don't reset the error because it's set before it's read)
        self.details.attempts = 1;
        // Convert the step size to seconds -- it's mutable because we may change it below
        let mut step_size = self.step_size.to_seconds();
        loop {
            let ki = self
                .prop
                .dynamics
                .eom(0.0, state_vec, state_ctx)
                .context(DynamicsSnafu)?;
            self.k[0] = ki;
            let mut a_idx: usize = 0;
            for i in 0..(self.prop.stages - 1) {
                // c_i = \sum_{j=1}^{i-1} a_ij
                let mut ci: f64 = 0.0;
                // wi = a_{s1} * k_1 + a_{s2} * k_2 + ... + a_{s, s-1} * k_{s-1}
                let mut wi = OVector::<f64, <D::StateType as State>::VecLength>::zeros();
                for kj in &self.k[0..i + 1] {
                    let a_ij = self.prop.a_coeffs[a_idx];
                    ci += a_ij;
                    wi += a_ij * kj;
                    a_idx += 1;
                }

                let ki = self
                    .prop
                    .dynamics
                    .eom(ci * step_size, &(state_vec + step_size * wi), state_ctx)
                    .context(DynamicsSnafu)?;
                self.k[i + 1] = ki;
            }
            // Compute the next state and the error
            let mut next_state = state_vec.clone();
            // Consistent with GMAT https://github.com/ChristopherRabotin/GMAT/blob/37201a6290e7f7b941bc98ee973a527a5857104b/src/base/propagator/RungeKutta.cpp#L537
            let mut error_est = OVector::<f64, <D::StateType as State>::VecLength>::zeros();
            for (i, ki) in self.k.iter().enumerate() {
                let b_i = self.prop.b_coeffs[i];
                if !self.fixed_step {
                    let b_i_star = self.prop.b_coeffs[i + self.prop.stages];
                    error_est += step_size * (b_i - b_i_star) * ki;
                }
                next_state += step_size * b_i * ki;
            }

            if self.fixed_step {
                self.details.step = self.step_size;
                return Ok((self.details.step, next_state));
            }

            self.details.error = E::estimate(&error_est, &next_state, state_vec);
            if self.details.error <= self.prop.opts.tolerance
                || step_size.abs() <= self.prop.opts.min_step.to_seconds()
                || self.details.attempts >= self.prop.opts.attempts
            {
                if self.details.attempts >= self.prop.opts.attempts {
                    warn!(
                        "Could not further decrease step size: maximum number of attempts reached ({})",
                        self.details.attempts
                    );
                }

                self.details.step = step_size * Unit::Second;
                if self.details.error < self.prop.opts.tolerance {
                    // Error is less than tolerance, let's attempt to increase the step for the next iteration.
                    let proposed_step = 0.9
                        * step_size
                        * (self.prop.opts.tolerance / self.details.error)
                            .powf(1.0 / f64::from(self.prop.order));
                    let max_step = self.prop.opts.max_step.to_seconds();
                    step_size = proposed_step.signum() * proposed_step.abs().min(max_step);
                }
                self.step_size = step_size * Unit::Second;
                return Ok((self.details.step, next_state));
            }

            // Error is too high: shrink the step and try again.
            self.details.attempts += 1;
            let proposed_step = 0.9
                * step_size
                * (self.prop.opts.tolerance / self.details.error)
                    .powf(1.0 / f64::from(self.prop.order - 1));
            let min_step = self.prop.opts.min_step.to_seconds();
            step_size = proposed_step.signum() * proposed_step.abs().max(min_step);
        }
    }

    /// Copy the details of the latest integration step.
    pub fn latest_details(&self) -> IntegrationDetails {
        self.details
    }
}
