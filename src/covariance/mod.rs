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

use crate::cosmic::{AstroError, Frame, LocalOrbitalFrame, OrbitType, PositionAngle};
use crate::linalg::{Matrix6, Vector6};
use crate::polyfit::InterpolationError;
use crate::time::Epoch;
use snafu::prelude::*;
use std::fmt;

mod scalar;
pub use scalar::CovarScalar;

mod harvester;
pub use harvester::{CartesianStmHarvester, KeplerianStmHarvester, StmHarvester};

pub mod interpolator;

mod provider;
pub use provider::StmCovarianceProvider;

mod shift;
mod transform;

/// Number of entries of a covariance additional state
pub const ADDITIONAL_STATE_LEN: usize = 36;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CovarianceError {
    #[snafu(display(
        "{orbit_type} covariance in {frame} requires a Cartesian representation since {frame} is not inertial"
    ))]
    IncompatibleRepresentation {
        orbit_type: OrbitType,
        frame: &'static str,
    },
    #[snafu(display("not enough data for covariance interpolation: {count} samples, {needed} needed"))]
    InsufficientSamples { count: usize, needed: usize },
    #[snafu(display(
        "cannot interpolate at {epoch}: more than {threshold_s} s outside of [{first}; {last}]"
    ))]
    ExtrapolationBeyondThreshold {
        epoch: Epoch,
        first: Epoch,
        last: Epoch,
        threshold_s: f64,
    },
    #[snafu(display("{msg}"))]
    MismatchedStateDefinitions { msg: String },
    #[snafu(display("interpolation samples must be strictly increasing in time but {epoch} is not"))]
    NonIncreasingEpochs { epoch: Epoch },
    #[snafu(display("dimension mismatch: expected {expected} got {got}"))]
    DimensionMismatch { expected: usize, got: usize },
    #[snafu(display("covariance in a local orbital frame ({lof}) can only be Cartesian"))]
    TypeChangeInLocalFrame { lof: LocalOrbitalFrame },
    #[snafu(display("covariance conversion failed: {source}"))]
    CovarianceAstro { source: AstroError },
    #[snafu(display("no state transition matrix available at {epoch}"))]
    StmUnavailable { epoch: Epoch },
    #[snafu(display("covariance interpolation failed: {source}"))]
    CovarianceInterpolation { source: InterpolationError },
}

/// The axes a covariance is expressed in: exactly one of a frame or a local orbital frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CovarianceFrame {
    Frame(Frame),
    Local(LocalOrbitalFrame),
}

impl fmt::Display for CovarianceFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Frame(frame) => write!(f, "{frame}"),
            Self::Local(lof) => write!(f, "{lof}"),
        }
    }
}

/// State covariance of an orbit, tagged with everything needed to interpret it.
///
/// A covariance is immutable: every conversion returns a new covariance. The orbit needed by the
/// conversions is always provided by the caller and should be at the epoch of the covariance.
///
/// # Invariants
/// + A covariance in a local orbital frame is Cartesian.
/// + A covariance in a non-inertial frame must be Cartesian to be converted. This is checked when converting.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Covariance<T: CovarScalar = f64> {
    matrix: Matrix6<T>,
    epoch: Epoch,
    frame: CovarianceFrame,
    orbit_type: OrbitType,
    angle: PositionAngle,
}

impl<T: CovarScalar> Covariance<T> {
    /// Creates a new covariance in the provided frame.
    ///
    /// The position angle of a Cartesian covariance is meaningless and normalized to `True`.
    pub fn new(
        matrix: Matrix6<T>,
        epoch: Epoch,
        frame: Frame,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Self {
        if !frame.is_inertial() && orbit_type != OrbitType::Cartesian {
            warn!("{orbit_type} covariance defined in non-inertial {frame}: it will not be convertible");
        }
        Self {
            matrix,
            epoch,
            frame: CovarianceFrame::Frame(frame),
            orbit_type,
            angle: orbit_type.normalized_angle(angle),
        }
    }

    /// Creates a new Cartesian covariance in the provided local orbital frame.
    pub fn in_local_frame(matrix: Matrix6<T>, epoch: Epoch, lof: LocalOrbitalFrame) -> Self {
        Self {
            matrix,
            epoch,
            frame: CovarianceFrame::Local(lof),
            orbit_type: OrbitType::Cartesian,
            angle: PositionAngle::True,
        }
    }

    /// Creates a diagonal covariance from the standard deviations of each component.
    pub fn from_sigmas(
        sigmas: &Vector6<T>,
        epoch: Epoch,
        frame: Frame,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Self {
        let mut matrix = Matrix6::from_element(T::zero());
        for i in 0..6 {
            matrix[(i, i)] = sigmas[i] * sigmas[i];
        }
        Self::new(matrix, epoch, frame, orbit_type, angle)
    }

    pub fn matrix(&self) -> &Matrix6<T> {
        &self.matrix
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn covariance_frame(&self) -> CovarianceFrame {
        self.frame
    }

    /// Returns the frame of this covariance, if it is not in a local orbital frame
    pub fn frame(&self) -> Option<Frame> {
        match self.frame {
            CovarianceFrame::Frame(frame) => Some(frame),
            CovarianceFrame::Local(_) => None,
        }
    }

    /// Returns the local orbital frame of this covariance, if any
    pub fn local_frame(&self) -> Option<LocalOrbitalFrame> {
        match self.frame {
            CovarianceFrame::Frame(_) => None,
            CovarianceFrame::Local(lof) => Some(lof),
        }
    }

    pub fn orbit_type(&self) -> OrbitType {
        self.orbit_type
    }

    pub fn position_angle(&self) -> PositionAngle {
        self.angle
    }

    /// Returns the standard deviations, i.e. the square root of the diagonal.
    pub fn sigmas(&self) -> Vector6<T> {
        Vector6::from_fn(|i, _| self.matrix[(i, i)].sqrt())
    }

    /// Projects this covariance onto real numbers, dropping any derivative information.
    pub fn real(&self) -> Covariance<f64> {
        Covariance {
            matrix: self.matrix.map(|x| x.real()),
            epoch: self.epoch,
            frame: self.frame,
            orbit_type: self.orbit_type,
            angle: self.angle,
        }
    }

    /// Returns the matrix flattened in row major order, as stored in an additional state slot
    pub fn to_additional_state(&self) -> Vec<T> {
        let mut state = Vec::with_capacity(ADDITIONAL_STATE_LEN);
        for i in 0..6 {
            for j in 0..6 {
                state.push(self.matrix[(i, j)]);
            }
        }
        state
    }

    /// Rebuilds a covariance from a row major additional state
    pub fn from_additional_state(
        state: &[T],
        epoch: Epoch,
        frame: CovarianceFrame,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Result<Self, CovarianceError> {
        ensure!(
            state.len() == ADDITIONAL_STATE_LEN,
            DimensionMismatchSnafu {
                expected: ADDITIONAL_STATE_LEN,
                got: state.len()
            }
        );
        let matrix = Matrix6::from_row_slice(state);
        match frame {
            CovarianceFrame::Frame(frame) => Ok(Self::new(matrix, epoch, frame, orbit_type, angle)),
            CovarianceFrame::Local(lof) => {
                ensure!(
                    orbit_type == OrbitType::Cartesian,
                    TypeChangeInLocalFrameSnafu { lof }
                );
                Ok(Self::in_local_frame(matrix, epoch, lof))
            }
        }
    }

    /// Checks the representation invariant
    pub(crate) fn check_representation(&self) -> Result<(), CovarianceError> {
        if let CovarianceFrame::Frame(frame) = self.frame {
            ensure!(
                frame.is_inertial() || self.orbit_type == OrbitType::Cartesian,
                IncompatibleRepresentationSnafu {
                    orbit_type: self.orbit_type,
                    frame: frame.name
                }
            );
        }
        Ok(())
    }

    /// Returns a copy with a new matrix `jac * P * jac^T` and the provided tags.
    pub(crate) fn congruence(
        &self,
        jac: &Matrix6<f64>,
        epoch: Epoch,
        frame: CovarianceFrame,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Self {
        Self {
            matrix: congruence(jac, &self.matrix),
            epoch,
            frame,
            orbit_type,
            angle: orbit_type.normalized_angle(angle),
        }
    }
}

/// Computes `jac * matrix * jac^T`
pub(crate) fn congruence<T: CovarScalar>(jac: &Matrix6<f64>, matrix: &Matrix6<T>) -> Matrix6<T> {
    let mut left = Matrix6::from_element(T::zero());
    for i in 0..6 {
        for l in 0..6 {
            let mut acc = T::zero();
            for k in 0..6 {
                acc = acc + matrix[(k, l)].scale(jac[(i, k)]);
            }
            left[(i, l)] = acc;
        }
    }
    let mut out = Matrix6::from_element(T::zero());
    for i in 0..6 {
        for j in 0..6 {
            let mut acc = T::zero();
            for l in 0..6 {
                acc = acc + left[(i, l)].scale(jac[(j, l)]);
            }
            out[(i, j)] = acc;
        }
    }
    out
}

impl fmt::Display for Covariance<f64> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} covariance ({}) in {} @ {}{}",
            self.orbit_type, self.angle, self.frame, self.epoch, self.matrix
        )
    }
}

impl fmt::LowerExp for Covariance<f64> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} covariance ({}) in {} @ {}",
            self.orbit_type, self.angle, self.frame, self.epoch
        )?;
        for i in 0..6 {
            let row: Vec<String> = (0..6).map(|j| format!("{:e}", self.matrix[(i, j)])).collect();
            writeln!(f, "[{}]", row.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod ut_covariance {
    use super::*;
    use crate::cosmic::LocalFrame;
    use crate::linalg::U7;
    use hyperdual::OHyperdual;

    fn epoch() -> Epoch {
        Epoch::from_gregorian_utc_at_noon(2024, 2, 29)
    }

    #[test]
    fn additional_state_round_trip() {
        let mut matrix = Matrix6::identity();
        matrix[(0, 5)] = 1e-5;
        matrix[(5, 0)] = 2e-5;
        let cov = Covariance::new(
            matrix,
            epoch(),
            Frame::eme2000(),
            OrbitType::Cartesian,
            PositionAngle::Mean,
        );
        // Cartesian angles are normalized
        assert_eq!(cov.position_angle(), PositionAngle::True);
        let state = cov.to_additional_state();
        assert_eq!(state.len(), ADDITIONAL_STATE_LEN);
        // Row major
        assert_eq!(state[5], 1e-5);
        assert_eq!(state[30], 2e-5);
        let rebuilt = Covariance::from_additional_state(
            &state,
            epoch(),
            cov.covariance_frame(),
            OrbitType::Cartesian,
            PositionAngle::True,
        )
        .unwrap();
        assert_eq!(rebuilt, cov);
    }

    #[test]
    fn additional_state_wrong_length() {
        let err = Covariance::from_additional_state(
            &[1.0; 35],
            epoch(),
            CovarianceFrame::Frame(Frame::eme2000()),
            OrbitType::Cartesian,
            PositionAngle::True,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CovarianceError::DimensionMismatch {
                expected: 36,
                got: 35
            }
        );
    }

    #[test]
    fn local_frame_tags() {
        let lof = LocalOrbitalFrame::rotating(LocalFrame::RIC);
        let cov = Covariance::in_local_frame(Matrix6::<f64>::identity(), epoch(), lof);
        assert_eq!(cov.local_frame(), Some(lof));
        assert!(cov.frame().is_none());
        assert_eq!(cov.orbit_type(), OrbitType::Cartesian);
        assert!(Covariance::from_additional_state(
            &cov.to_additional_state(),
            epoch(),
            cov.covariance_frame(),
            OrbitType::Keplerian,
            PositionAngle::True
        )
        .is_err());
    }

    #[test]
    fn dual_projection_and_sigmas() {
        let sigmas = Vector6::from_fn(|i, _| {
            OHyperdual::<f64, U7>::from_slice(&[(i + 1) as f64, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0])
        });
        let cov = Covariance::from_sigmas(
            &sigmas,
            epoch(),
            Frame::eme2000(),
            OrbitType::Cartesian,
            PositionAngle::True,
        );
        let real = cov.real();
        assert_eq!(real.matrix()[(2, 2)], 9.0);
        // d(s^2)/dp = 2 s
        assert_eq!(cov.matrix()[(2, 2)][1], 6.0);
        assert_eq!(real.sigmas()[2], 3.0);
        println!("{real}\n{real:e}");
    }

    #[test]
    fn congruence_with_identity_is_exact() {
        let mut matrix = Matrix6::from_fn(|i, j| 1.0 / (1.0 + i as f64 + j as f64));
        matrix[(0, 0)] = std::f64::consts::PI;
        assert_eq!(congruence(&Matrix6::identity(), &matrix), matrix);
    }
}
