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

/*! # nyx-covariance

State covariance management for spacecraft: an immutable covariance value tagged with its epoch,
frame (or local orbital frame) and orbital element parameterization, the congruence transforms
between all of these, an analytical Keplerian time shift, an STM based covariance provider which
rides along a trajectory propagator, and covariance time interpolators.

Refer to [nyxspace.com](https://nyxspace.com) for the MathSpec of the underlying astrodynamics.
*/

/// Covariance value type, its frame and element conversions, its propagation and its interpolation.
pub mod covariance;

/// Provides the frames, orbits, local orbital frames and orbital element Jacobians.
pub mod cosmic;

/// Provides the two body dynamics, including the state transition matrix computation.
pub mod dynamics;

/// Provides all the propagators / integrators available in `nyx`.
pub mod propagators;

/// Trajectories (ephemerides) generated by the propagators.
pub mod md;

/// Polynomial and fitting module
pub mod polyfit;

/// Configuration loading from YAML files.
pub mod io;

/// Utility functions shared by different modules, and which may be useful to engineers.
pub mod utils;

mod errors;
/// Nyx will (almost) never panic and functions which may fail will return an error.
pub use self::errors::NyxError;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub use self::cosmic::{Frame, Orbit, State, TimeTagged};
pub use self::covariance::Covariance;
