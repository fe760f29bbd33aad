extern crate nyx_covariance as nyx;

use nyx::cosmic::Frame;
use nyx::dynamics::OrbitalDynamics;
use nyx::linalg::Matrix6;
use nyx::propagators::*;
use nyx::time::{Epoch, Unit};
use nyx::utils::mat_rel_error;
use nyx::{Orbit, State};

// Compares the STM integrated with the hyperdual Jacobian of the dynamics against central finite differences.
#[test]
fn stm_matches_finite_differences() {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let prop = Propagator::new::<RK4Fixed>(
        OrbitalDynamics::two_body(),
        PropOpts::with_fixed_step(10 * Unit::Second),
    );

    // Mostly linear regime (low eccentricity), then a more non linear one starting at periapsis
    for ecc in [1e-5, 0.2] {
        let init = Orbit::keplerian(8000.0, ecc, 10.0, 5.0, 25.0, 0.0, epoch, Frame::eme2000());

        let end = prop
            .with(init.with_stm())
            .for_duration(10 * Unit::Minute)
            .unwrap();
        let stm = end.stm().unwrap();

        let mut stm_fd = Matrix6::<f64>::zeros();
        for i in 0..6 {
            let pert = if i < 3 { 1e-3 } else { 1e-6 };
            let mut plus = init.to_cartesian_vec();
            let mut minus = init.to_cartesian_vec();
            plus[i] += pert;
            minus[i] -= pert;
            let end_plus = prop
                .with(Orbit::cartesian_vec(&plus, epoch, init.frame))
                .for_duration(10 * Unit::Minute)
                .unwrap();
            let end_minus = prop
                .with(Orbit::cartesian_vec(&minus, epoch, init.frame))
                .for_duration(10 * Unit::Minute)
                .unwrap();
            let column = (end_plus.to_cartesian_vec() - end_minus.to_cartesian_vec()) / (2.0 * pert);
            stm_fd.set_column(i, &column);
        }

        let err = mat_rel_error(&stm, &stm_fd);
        assert!(err < 1e-6, "ecc = {ecc}: STM error {err:e}");
        // The state itself is unaffected by the STM propagation
        let without = prop.with(init).for_duration(10 * Unit::Minute).unwrap();
        assert!((without.to_cartesian_vec() - end.to_cartesian_vec()).amax() < 1e-9);
    }
}

#[test]
fn stm_composition() {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let init = Orbit::keplerian(7000.0, 0.01, 45.0, 5.0, 25.0, 0.0, epoch, Frame::eme2000());
    let prop = Propagator::new::<RK4Fixed>(
        OrbitalDynamics::two_body(),
        PropOpts::with_fixed_step(5 * Unit::Second),
    );

    let mid = prop
        .with(init.with_stm())
        .for_duration(15 * Unit::Minute)
        .unwrap();
    let end = prop
        .with(mid.with_stm())
        .for_duration(15 * Unit::Minute)
        .unwrap();
    let direct = prop
        .with(init.with_stm())
        .for_duration(30 * Unit::Minute)
        .unwrap();

    let composed = end.stm().unwrap() * mid.stm().unwrap();
    assert!(mat_rel_error(&composed, &direct.stm().unwrap()) < 1e-9);
}
