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

use super::{
    CovarScalar, Covariance, CovarianceError, CovarianceFrame, IncompatibleRepresentationSnafu,
    StmHarvester,
};
use crate::cosmic::{Frame, LocalOrbitalFrame, Orbit, OrbitType, PositionAngle};
use snafu::ensure;

/// Provides the covariance of a propagated state from the initial covariance and the STM of the propagation.
///
/// The provider does not take part in the integration: it reads the STM of each reached state from its
/// harvester, and maps the initial covariance with it, `P(t) = Φ(t, t0) P0 Φ(t, t0)^T`.
/// The result is expressed in the working representation of the propagation: the frame of the
/// initial orbit with the orbit type of the harvester.
///
/// One provider must be used per propagation.
#[derive(Clone, Debug)]
pub struct StmCovarianceProvider<H: StmHarvester, T: CovarScalar = f64> {
    initial: Covariance<T>,
    frame: Frame,
    harvester: H,
}

impl<H: StmHarvester, T: CovarScalar> StmCovarianceProvider<H, T> {
    /// Attaches the initial covariance to a propagation starting at the initial orbit.
    ///
    /// The initial covariance is converted to the working representation of the harvester.
    pub fn new(
        initial_covariance: &Covariance<T>,
        initial_orbit: &Orbit,
        harvester: H,
    ) -> Result<Self, CovarianceError> {
        let frame = initial_orbit.frame;
        let orbit_type = harvester.orbit_type();
        let angle = harvester.position_angle();
        ensure!(
            frame.is_inertial() || orbit_type == OrbitType::Cartesian,
            IncompatibleRepresentationSnafu {
                orbit_type,
                frame: frame.name
            }
        );
        // Go through Cartesian since the initial covariance may be in another type and a rotating frame.
        let initial = initial_covariance
            .change_type(initial_orbit, OrbitType::Cartesian, PositionAngle::True)?
            .change_frame(initial_orbit, frame)?
            .change_type(initial_orbit, orbit_type, angle)?;
        info!(
            "covariance provider initialized in {frame} with {orbit_type} ({angle}) at {}",
            initial.epoch()
        );
        Ok(Self {
            initial,
            frame,
            harvester,
        })
    }

    /// Returns the initial covariance in the working representation
    pub fn initial_covariance(&self) -> &Covariance<T> {
        &self.initial
    }

    pub fn harvester(&self) -> &H {
        &self.harvester
    }

    /// Returns the additional state (row major covariance matrix) to attach to this state
    pub fn additional_state(&self, state: &Orbit) -> Result<Vec<T>, CovarianceError> {
        Ok(self.covariance_at(state)?.to_additional_state())
    }

    /// Returns the covariance of the state, in the working representation of the propagation.
    pub fn covariance_at(&self, state: &Orbit) -> Result<Covariance<T>, CovarianceError> {
        let stm = self.harvester.state_transition_matrix(state)?;
        if state.frame != self.frame {
            warn!(
                "state in {} but covariance propagated in {}",
                state.frame, self.frame
            );
        }
        Ok(self.initial.congruence(
            &stm,
            state.epoch,
            CovarianceFrame::Frame(self.frame),
            self.harvester.orbit_type(),
            self.harvester.position_angle(),
        ))
    }

    /// Returns the covariance of the state in the requested frame, keeping the working orbit type.
    pub fn covariance_in_frame(
        &self,
        state: &Orbit,
        frame: Frame,
    ) -> Result<Covariance<T>, CovarianceError> {
        self.covariance_at(state)?.change_frame(state, frame)
    }

    /// Returns the covariance of the state in a local orbital frame of that state.
    pub fn covariance_in_local_frame(
        &self,
        state: &Orbit,
        lof: LocalOrbitalFrame,
    ) -> Result<Covariance<T>, CovarianceError> {
        self.covariance_at(state)?.change_local_frame(state, lof)
    }

    /// Returns the covariance of the state with the requested orbit type and position angle, in the working frame.
    pub fn covariance_as_type(
        &self,
        state: &Orbit,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Result<Covariance<T>, CovarianceError> {
        self.covariance_at(state)?
            .change_type(state, orbit_type, angle)
    }
}

#[cfg(test)]
mod ut_provider {
    use super::*;
    use crate::covariance::{CartesianStmHarvester, KeplerianStmHarvester};
    use crate::linalg::{Matrix6, Vector6};
    use crate::time::{Epoch, Unit};
    use crate::utils::mat_rel_error;

    struct FixedHarvester(Matrix6<f64>);

    impl StmHarvester for FixedHarvester {
        fn state_transition_matrix(&self, _state: &Orbit) -> Result<Matrix6<f64>, CovarianceError> {
            Ok(self.0)
        }
        fn orbit_type(&self) -> OrbitType {
            OrbitType::Cartesian
        }
        fn position_angle(&self) -> PositionAngle {
            PositionAngle::True
        }
    }

    fn orbit() -> Orbit {
        Orbit::keplerian(
            26_560.0,
            0.01,
            55.0,
            10.0,
            20.0,
            30.0,
            Epoch::from_gregorian_utc_at_noon(2025, 3, 3),
            Frame::eme2000(),
        )
    }

    fn cov(orbit: &Orbit) -> Covariance {
        Covariance::from_sigmas(
            &Vector6::new(1.0, 1.0, 1.0, 1e-3, 1e-3, 1e-3),
            orbit.epoch,
            orbit.frame,
            OrbitType::Cartesian,
            PositionAngle::True,
        )
    }

    #[test]
    fn stub_harvester() {
        let orbit = orbit();
        let mut stm = Matrix6::identity();
        stm[(0, 3)] = 60.0;
        let provider = StmCovarianceProvider::new(&cov(&orbit), &orbit, FixedHarvester(stm)).unwrap();
        let later = Orbit {
            epoch: orbit.epoch + Unit::Minute,
            ..orbit
        };
        let propagated = provider.covariance_at(&later).unwrap();
        assert_eq!(propagated.epoch(), later.epoch);
        // var(x + 60 vx) = 1 + 3600 * 1e-6
        assert!((propagated.matrix()[(0, 0)] - 1.0036).abs() < 1e-12);
        assert!((propagated.matrix()[(0, 3)] - 60e-6).abs() < 1e-15);
        assert_eq!(provider.additional_state(&later).unwrap().len(), 36);
    }

    #[test]
    fn missing_stm() {
        let orbit = orbit();
        let provider = StmCovarianceProvider::new(&cov(&orbit), &orbit, CartesianStmHarvester).unwrap();
        assert_eq!(
            provider.covariance_at(&orbit),
            Err(CovarianceError::StmUnavailable { epoch: orbit.epoch })
        );
        let propagated = provider.covariance_at(&orbit.with_stm()).unwrap();
        assert_eq!(propagated.matrix(), cov(&orbit).matrix());
    }

    #[test]
    fn keplerian_harvester_matches_shift() {
        let orbit = orbit();
        let initial = cov(&orbit);
        let provider = StmCovarianceProvider::new(
            &initial,
            &orbit,
            KeplerianStmHarvester::new(orbit).unwrap(),
        )
        .unwrap();
        assert_eq!(provider.initial_covariance().orbit_type(), OrbitType::Keplerian);
        let dt = 3 * Unit::Hour;
        let later = orbit.at_epoch(orbit.epoch + dt).unwrap();
        let from_provider = provider
            .covariance_as_type(&later, OrbitType::Cartesian, PositionAngle::True)
            .unwrap();
        let shifted = initial.shifted_by(&orbit, dt).unwrap();
        assert_eq!(from_provider.epoch(), shifted.epoch());
        let err = mat_rel_error(from_provider.matrix(), shifted.matrix());
        assert!(err < 1e-8, "{err:e}");
    }
}
