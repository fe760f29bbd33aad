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

use snafu::Snafu;

/// Hermite interpolation with an arbitrary number of derivatives per node
pub mod hermite;
pub use hermite::{hermite_eval, hermite_eval_orders};

#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InterpolationError {
    #[snafu(display("no {what} data to interpolate"))]
    NoInterpolationData { what: &'static str },
    #[snafu(display("lengths of {what} data differ: expected {expected} got {got}"))]
    MismatchedLengths {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[snafu(display("abscissa {x} is repeated in the interpolation nodes"))]
    NonDistinctAbscissas { x: f64 },
    #[snafu(display("invalid interpolation: {msg}"))]
    InvalidInterpolation { msg: String },
}
