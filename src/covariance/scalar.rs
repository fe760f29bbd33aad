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

use crate::linalg::U7;
use hyperdual::OHyperdual;
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

/// Numbers a covariance may be made of: plain floats or derivative carrying hyperdual numbers.
///
/// The Jacobians applied to a covariance are always real valued, so only the operations
/// needed by a congruence with a real matrix are required.
pub trait CovarScalar:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    /// Embeds a real number, with zero derivatives if any
    fn from_real(value: f64) -> Self;

    /// Projects out the derivative part
    fn real(&self) -> f64;

    fn sqrt(self) -> Self;

    fn zero() -> Self {
        Self::from_real(0.0)
    }

    /// Multiplies by a real scalar
    fn scale(self, factor: f64) -> Self {
        Self::from_real(factor) * self
    }
}

impl CovarScalar for f64 {
    fn from_real(value: f64) -> Self {
        value
    }

    fn real(&self) -> f64 {
        *self
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn scale(self, factor: f64) -> Self {
        factor * self
    }
}

impl CovarScalar for OHyperdual<f64, U7> {
    fn from_real(value: f64) -> Self {
        OHyperdual::from(value)
    }

    fn real(&self) -> f64 {
        self[0]
    }

    fn sqrt(self) -> Self {
        hyperdual::Float::sqrt(self)
    }
}
