extern crate nyx_covariance as nyx;
extern crate pretty_env_logger;

use super::{correlated_matrix, leo_orbit, teme_like};
use nyx::cosmic::{Frame, LocalFrame, LocalOrbitalFrame, OrbitType, PositionAngle};
use nyx::covariance::{
    CartesianStmHarvester, Covariance, CovarianceError, KeplerianStmHarvester,
    StmCovarianceProvider, ADDITIONAL_STATE_LEN,
};
use nyx::dynamics::OrbitalDynamics;
use nyx::propagators::{PropOpts, Propagator};
use nyx::time::Unit;
use nyx::utils::mat_rel_error;
use nyx::{NyxError, Orbit};
use std::sync::mpsc::channel;

fn initial_covariance(orbit: &Orbit) -> Covariance {
    Covariance::new(
        correlated_matrix(),
        orbit.epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    )
}

#[test]
fn live_and_trajectory_covariances_match() {
    let _ = pretty_env_logger::try_init();

    let orbit = leo_orbit().with_stm();
    let provider =
        StmCovarianceProvider::new(&initial_covariance(&orbit), &orbit, CartesianStmHarvester)
            .unwrap();

    let setup = Propagator::default(OrbitalDynamics::two_body());
    let (tx, rx) = channel();
    let end_state = setup
        .with(orbit)
        .for_duration_with_channel(45 * Unit::Minute, tx)
        .unwrap();
    let live: Vec<Orbit> = rx.into_iter().collect();

    let (traj_end, traj) = setup
        .with(orbit)
        .for_duration_with_traj(45 * Unit::Minute)
        .unwrap();
    assert_eq!(traj_end.epoch, end_state.epoch);

    for state in &live {
        let node = traj.at(state.epoch).unwrap();
        let from_live = provider.covariance_at(state).unwrap();
        let from_traj = provider.covariance_at(&node).unwrap();
        assert_eq!(from_live, from_traj, "mismatch at {}", state.epoch);
    }

    // The covariance evolves along the propagation
    let final_cov = provider.covariance_at(&end_state).unwrap();
    assert_eq!(final_cov.epoch(), end_state.epoch);
    assert_ne!(final_cov.matrix(), provider.initial_covariance().matrix());

    let additional = provider.additional_state(&end_state).unwrap();
    assert_eq!(additional.len(), ADDITIONAL_STATE_LEN);
    assert_eq!(additional[1], final_cov.matrix()[(0, 1)]);
}

#[test]
fn interpolated_trajectory_covariance_matches_live() {
    let orbit = leo_orbit().with_stm();
    let provider =
        StmCovarianceProvider::new(&initial_covariance(&orbit), &orbit, CartesianStmHarvester)
            .unwrap();

    let setup = Propagator::dp45(OrbitalDynamics::two_body(), PropOpts::with_tolerance(1e-13));
    let (_, traj) = setup
        .with(orbit)
        .until_epoch_with_traj(orbit.epoch + 45 * Unit::Minute)
        .unwrap();

    for offset_s in [61.25, 1_234.5, 2_599.75] {
        let epoch = orbit.epoch + offset_s * Unit::Second;
        let interpolated = traj.at(epoch).unwrap();
        let live = setup.with(orbit).until_epoch(epoch).unwrap();
        assert_eq!(interpolated.epoch, live.epoch);

        let from_traj = provider.covariance_at(&interpolated).unwrap();
        let from_live = provider.covariance_at(&live).unwrap();
        let err = mat_rel_error(from_traj.matrix(), from_live.matrix());
        assert!(err < 1e-6, "relative error {err:e} at {epoch}");
        // The velocity block is orders of magnitude smaller, check it on its own
        let vel_err = (from_traj.matrix().fixed_view::<3, 3>(3, 3)
            - from_live.matrix().fixed_view::<3, 3>(3, 3))
        .amax()
            / from_live.matrix().fixed_view::<3, 3>(3, 3).amax();
        assert!(vel_err < 1e-5, "velocity error {vel_err:e} at {epoch}");
    }
}

#[test]
fn accessors_match_explicit_conversions() {
    let orbit = leo_orbit().with_stm();
    let provider =
        StmCovarianceProvider::new(&initial_covariance(&orbit), &orbit, CartesianStmHarvester)
            .unwrap();
    let state = Propagator::default(OrbitalDynamics::two_body())
        .with(orbit)
        .for_duration(20 * Unit::Minute)
        .unwrap();

    let base = provider.covariance_at(&state).unwrap();
    assert_eq!(
        provider.covariance_in_frame(&state, teme_like()).unwrap(),
        base.change_frame(&state, teme_like()).unwrap()
    );
    let lof = LocalOrbitalFrame::rotating(LocalFrame::VNC);
    assert_eq!(
        provider.covariance_in_local_frame(&state, lof).unwrap(),
        base.change_local_frame(&state, lof).unwrap()
    );
    assert_eq!(
        provider
            .covariance_as_type(&state, OrbitType::Equinoctial, PositionAngle::Mean)
            .unwrap(),
        base.change_type(&state, OrbitType::Equinoctial, PositionAngle::Mean)
            .unwrap()
    );
}

#[test]
fn keplerian_harvester_agrees_with_numerical_stm() {
    let orbit = leo_orbit().with_stm();
    let cov = initial_covariance(&orbit);
    let numerical = StmCovarianceProvider::new(&cov, &orbit, CartesianStmHarvester).unwrap();
    let analytical = StmCovarianceProvider::new(
        &cov,
        &orbit,
        KeplerianStmHarvester::new(orbit.without_stm()).unwrap(),
    )
    .unwrap();
    assert_eq!(
        analytical.initial_covariance().orbit_type(),
        OrbitType::Keplerian
    );

    let opts = PropOpts::with_tolerance(1e-13);
    let state = Propagator::dp45(OrbitalDynamics::two_body(), opts)
        .with(orbit)
        .for_duration(1 * Unit::Hour)
        .unwrap();

    let from_stm = numerical.covariance_at(&state).unwrap();
    let from_kepler = analytical
        .covariance_as_type(&state, OrbitType::Cartesian, PositionAngle::True)
        .unwrap();
    let err = mat_rel_error(from_kepler.matrix(), from_stm.matrix());
    assert!(err < 1e-6, "relative error {err:e}");
}

#[test]
fn provider_errors() {
    let orbit = leo_orbit();
    let provider =
        StmCovarianceProvider::new(&initial_covariance(&orbit), &orbit, CartesianStmHarvester)
            .unwrap();
    // No STM on this state
    assert_eq!(
        provider.covariance_at(&orbit),
        Err(CovarianceError::StmUnavailable { epoch: orbit.epoch })
    );

    // The Keplerian harvester needs an inertial frame
    let fixed = orbit.in_frame(&Frame::earth_fixed());
    assert!(matches!(
        KeplerianStmHarvester::new(fixed),
        Err(CovarianceError::IncompatibleRepresentation { .. })
    ));

    let err: NyxError = Covariance::from_additional_state(
        &[0.0_f64; 35][..],
        orbit.epoch,
        nyx::covariance::CovarianceFrame::Frame(Frame::eme2000()),
        OrbitType::Cartesian,
        PositionAngle::True,
    )
    .unwrap_err()
    .into();
    assert_eq!(
        err,
        NyxError::CovarianceFailure {
            source: CovarianceError::DimensionMismatch {
                expected: 36,
                got: 35
            }
        }
    );
}
