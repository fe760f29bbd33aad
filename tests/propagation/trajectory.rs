extern crate nyx_covariance as nyx;
extern crate pretty_env_logger;

use nyx::cosmic::Frame;
use nyx::dynamics::OrbitalDynamics;
use nyx::md::trajectory::TrajError;
use nyx::propagators::*;
use nyx::time::{Epoch, Unit};
use nyx::utils::mat_rel_error;
use nyx::{Orbit, State};
use std::sync::mpsc::channel;

#[test]
fn traj_ephem() {
    let _ = pretty_env_logger::try_init();

    let start_dt = Epoch::from_gregorian_utc_at_noon(2021, 1, 1);
    let start_state = Orbit::cartesian(
        -2436.45,
        -2436.45,
        6891.037,
        5.088_611,
        -5.088_611,
        0.0,
        start_dt,
        Frame::eme2000(),
    );

    let setup = Propagator::default(OrbitalDynamics::two_body());
    let (end_state, ephem) = setup
        .with(start_state)
        .for_duration_with_traj(1 * Unit::Day)
        .unwrap();

    let mut cnt = 0;
    let mut max_sma_err = 0.0_f64;
    for state in ephem.every(1 * Unit::Hour) {
        cnt += 1;
        max_sma_err = max_sma_err.max((state.sma_km() - start_state.sma_km()).abs());
    }
    assert_eq!(cnt, 25);
    assert!(max_sma_err < 1e-4, "SMA error {max_sma_err:e}");

    assert_eq!(ephem.first(), Some(&start_state));
    assert_eq!(ephem.last(), Some(&end_state));
    assert!(ephem.last().unwrap().stm().is_err(), "STM is set!");
    assert_eq!(
        ephem.at(end_state.epoch + 1 * Unit::Nanosecond),
        Err(TrajError::NoInterpolationData {
            epoch: end_state.epoch + 1 * Unit::Nanosecond
        })
    );

    // Regenerate the truth with a channel and check that every state is stored and interpolated back exactly.
    let (tx, rx) = channel();
    setup
        .with(start_state)
        .for_duration_with_channel(1 * Unit::Day, tx)
        .unwrap();
    let truth: Vec<Orbit> = rx.into_iter().collect();
    assert_eq!(truth.len() + 1, ephem.states.len());
    for state in &truth {
        let stored = ephem.at(state.epoch).unwrap();
        assert_eq!(stored.to_cartesian_vec(), state.to_cartesian_vec());
    }
}

#[test]
fn traj_interpolation_accuracy() {
    let start_dt = Epoch::from_gregorian_utc_at_noon(2021, 1, 1);
    let start_state =
        Orbit::keplerian(7000.0, 0.01, 28.5, 10.0, 20.0, 30.0, start_dt, Frame::eme2000())
            .with_stm();

    let setup = Propagator::default_dp45(OrbitalDynamics::two_body());
    let end_dt = start_dt + 2 * Unit::Hour;
    let (end_state, ephem) = setup.with(start_state).until_epoch_with_traj(end_dt).unwrap();
    assert_eq!(end_state.epoch, end_dt);
    assert_eq!(ephem.last().unwrap().epoch, end_dt);

    // Between two nodes, compare against a direct propagation to that epoch
    let epoch = start_dt + 3_615 * Unit::Second;
    let interpolated = ephem.at(epoch).unwrap();
    let direct = setup.with(start_state).until_epoch(epoch).unwrap();

    assert_eq!(interpolated.epoch, epoch);
    assert!((interpolated.radius() - direct.radius()).norm() < 1e-5);
    assert!((interpolated.velocity() - direct.velocity()).norm() < 1e-8);
    let stm_err = mat_rel_error(&interpolated.stm().unwrap(), &direct.stm().unwrap());
    assert!(stm_err < 1e-6, "STM error {stm_err:e}");
}
