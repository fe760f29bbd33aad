extern crate nyx_covariance as nyx;

use nyx::cosmic::Frame;
use nyx::dynamics::OrbitalDynamics;
use nyx::propagators::*;
use nyx::time::{Epoch, Unit};
use nyx::Orbit;
use rstest::*;

#[fixture]
fn start_state() -> Orbit {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    Orbit::keplerian(
        8_000.0,
        0.2,
        30.0,
        60.0,
        60.0,
        180.0,
        epoch,
        Frame::eme2000(),
    )
}

#[rstest]
fn two_body_returns_after_one_period(start_state: Orbit) {
    let period = start_state.period();

    for prop in [
        Propagator::default(OrbitalDynamics::two_body()),
        Propagator::default_dp45(OrbitalDynamics::two_body()),
    ] {
        let end = prop.with(start_state).for_duration(period).unwrap();
        assert_eq!(end.epoch, start_state.epoch + period);
        // Same position and velocity one period later
        let delta = end.to_cartesian_vec() - start_state.to_cartesian_vec();
        assert!(
            delta.fixed_rows::<3>(0).amax() < 1e-4,
            "{end} != {start_state}"
        );
        assert!(
            delta.fixed_rows::<3>(3).amax() < 1e-7,
            "{end} != {start_state}"
        );
        assert!((end.energy_km2_s2() - start_state.energy_km2_s2()).abs() < 1e-8);
    }
}

#[rstest]
fn fixed_step_rk4(start_state: Orbit) {
    let prop = Propagator::new::<RK4Fixed>(
        OrbitalDynamics::two_body(),
        PropOpts::with_fixed_step(1 * Unit::Second),
    );
    let mut instance = prop.with(start_state);
    let end = instance.for_duration(10 * Unit::Minute).unwrap();
    assert_eq!(instance.latest_details().step, 1 * Unit::Second);
    assert!((end.sma_km() - start_state.sma_km()).abs() < 1e-6);
}

#[rstest]
fn backward_propagation(start_state: Orbit) {
    let prop = Propagator::dp45(
        OrbitalDynamics::two_body(),
        PropOpts::with_adaptive_step_s(1e-3, 60.0, 1e-12, RSSCartesianStep),
    );
    let forward = prop.with(start_state).for_duration(2 * Unit::Hour).unwrap();
    let backward = prop.with(forward).for_duration(-2 * Unit::Hour).unwrap();
    assert_eq!(backward.epoch, start_state.epoch);
    assert!(backward.eq_within(&start_state, 1e-4, 1e-7));
}

#[rstest]
fn invalid_options(start_state: Orbit) {
    let mut opts = PropOpts::default();
    opts.tolerance = -1.0;
    let prop = Propagator::cash_karp45(OrbitalDynamics::two_body(), opts);
    assert!(matches!(
        prop.with(start_state).for_duration(1 * Unit::Minute),
        Err(PropagationError::InvalidOptions { .. })
    ));
}
