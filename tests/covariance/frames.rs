extern crate nyx_covariance as nyx;

use approx::assert_abs_diff_eq;
use super::{correlated_matrix, leo_orbit, teme_like};
use enum_iterator::all;
use nyx::cosmic::{Frame, LocalFrame, LocalOrbitalFrame, OrbitType, PositionAngle};
use nyx::covariance::{Covariance, CovarianceError};
use nyx::linalg::{Matrix3, Matrix6, Vector3};
use nyx::time::Epoch;
use nyx::utils::{mat_rel_error, tilde_matrix};
use nyx::Orbit;
use rstest::*;

#[fixture]
fn orbit() -> Orbit {
    leo_orbit()
}

#[rstest]
fn inertial_round_trip(orbit: Orbit) {
    let cov = Covariance::new(
        correlated_matrix(),
        orbit.epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    );
    let back = cov
        .change_frame(&orbit, teme_like())
        .unwrap()
        .change_frame(&orbit, Frame::eme2000())
        .unwrap();
    assert_eq!(back.frame(), Some(Frame::eme2000()));
    assert!(mat_rel_error(back.matrix(), cov.matrix()) < 1e-15);
}

#[rstest]
fn identity_conversions_are_copies(orbit: Orbit) {
    let cov = Covariance::new(
        correlated_matrix(),
        orbit.epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    );
    assert_eq!(cov.change_frame(&orbit, Frame::eme2000()).unwrap(), cov);
    assert_eq!(
        cov.change_type(&orbit, OrbitType::Cartesian, PositionAngle::Mean)
            .unwrap(),
        cov
    );

    let lof = LocalOrbitalFrame::rotating(LocalFrame::TNW);
    let in_lof = Covariance::in_local_frame(correlated_matrix(), orbit.epoch, lof);
    assert_eq!(in_lof.change_local_frame(&orbit, lof).unwrap(), in_lof);
}

#[test]
fn inertial_ric_rotation_by_hand() {
    let epoch = Epoch::from_gregorian_utc_at_midnight(2026, 1, 1);
    let orbit = Orbit::cartesian(0.0, 7000.0, 0.0, -7.5, 0.0, 0.0, epoch, Frame::eme2000());
    let matrix = Matrix6::new(
        1.0, 0.0, 0.0, 0.0, 0.0, 1e-5, //
        0.0, 1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1e-3, 0.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 1e-3, 0.0, //
        1e-5, 0.0, 0.0, 0.0, 0.0, 1e-3,
    );
    let cov = Covariance::new(
        matrix,
        epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    );
    let ric = cov
        .change_local_frame(&orbit, LocalOrbitalFrame::inertial(LocalFrame::RIC))
        .unwrap();

    // R = +Y, I = -X, C = +Z
    let expected = Matrix6::new(
        1.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, -1e-5, //
        0.0, 0.0, 1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1e-3, 0.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 1e-3, 0.0, //
        0.0, -1e-5, 0.0, 0.0, 0.0, 1e-3,
    );
    assert_abs_diff_eq!(*ric.matrix(), expected, epsilon = 1e-20);
    assert_eq!(ric.orbit_type(), OrbitType::Cartesian);
    assert_eq!(
        ric.local_frame(),
        Some(LocalOrbitalFrame::inertial(LocalFrame::RIC))
    );
}

#[rstest]
fn multi_hop_round_trip(orbit: Orbit) {
    let cov = Covariance::new(
        correlated_matrix(),
        orbit.epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    );
    let back = cov
        .change_frame(&orbit, teme_like())
        .unwrap()
        .change_frame(&orbit, Frame::earth_fixed())
        .unwrap()
        .change_local_frame(&orbit, LocalOrbitalFrame::rotating(LocalFrame::NTW))
        .unwrap()
        .change_local_frame(&orbit, LocalOrbitalFrame::rotating(LocalFrame::RIC))
        .unwrap()
        .change_frame(&orbit, Frame::earth_fixed())
        .unwrap()
        .change_frame(&orbit, teme_like())
        .unwrap()
        .change_frame(&orbit, Frame::eme2000())
        .unwrap();
    let err = mat_rel_error(back.matrix(), cov.matrix());
    assert!(err < 1e-12, "relative error {err:e}");
}

#[rstest]
fn rotating_frame_couples_velocity(orbit: Orbit) {
    let cov = Covariance::new(
        correlated_matrix(),
        orbit.epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    );
    let fixed = cov.change_frame(&orbit, Frame::earth_fixed()).unwrap();

    // Rotation only, ignoring the rotation rate of the Earth fixed frame
    let (dcm, _) = Frame::earth_fixed().dcm_to_root(orbit.epoch);
    let rot: Matrix3<f64> = dcm.transpose();
    let mut jac = Matrix6::zeros();
    jac.fixed_view_mut::<3, 3>(0, 0).copy_from(&rot);
    jac.fixed_view_mut::<3, 3>(3, 3).copy_from(&rot);
    let rotation_only = jac * cov.matrix() * jac.transpose();

    // Positions agree, velocities do not.
    for i in 0..3 {
        for j in 0..3 {
            assert!((fixed.matrix()[(i, j)] - rotation_only[(i, j)]).abs() < 1e-15);
        }
    }
    let vel_diff = (fixed.matrix().fixed_view::<3, 3>(3, 3) - rotation_only.fixed_view::<3, 3>(3, 3)).amax();
    assert!(vel_diff > 1e-12, "rotation rate not accounted for: {vel_diff:e}");
}

/// Largest relative error of each 3x3 block, so the small velocity terms are not hidden by the position terms.
fn block_rel_error(candidate: &Matrix6<f64>, reference: &Matrix6<f64>) -> f64 {
    let mut worst: f64 = 0.0;
    for (i, j) in [(0, 0), (0, 3), (3, 0), (3, 3)] {
        let diff = (candidate.fixed_view::<3, 3>(i, j) - reference.fixed_view::<3, 3>(i, j)).amax();
        worst = worst.max(diff / reference.fixed_view::<3, 3>(i, j).amax());
    }
    worst
}

/// Central difference Jacobian of the state conversion into `frame`.
fn numerical_jacobian(orbit: &Orbit, frame: Frame) -> Matrix6<f64> {
    let state = orbit.to_cartesian_vec();
    let mut jac = Matrix6::zeros();
    for j in 0..6 {
        let step = if j < 3 { 1e-3 } else { 1e-6 };
        let mut plus = state;
        plus[j] += step;
        let mut minus = state;
        minus[j] -= step;
        let out_plus = Orbit::cartesian_vec(&plus, orbit.epoch, orbit.frame)
            .in_frame(&frame)
            .to_cartesian_vec();
        let out_minus = Orbit::cartesian_vec(&minus, orbit.epoch, orbit.frame)
            .in_frame(&frame)
            .to_cartesian_vec();
        jac.set_column(j, &((out_plus - out_minus) / (2.0 * step)));
    }
    jac
}

#[rstest]
fn rotating_frame_matches_numerical_jacobian(orbit: Orbit) {
    let cov = Covariance::new(
        correlated_matrix(),
        orbit.epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    );
    let jac = numerical_jacobian(&orbit, Frame::earth_fixed());
    let expected = jac * cov.matrix() * jac.transpose();

    let fixed = cov.change_frame(&orbit, Frame::earth_fixed()).unwrap();
    let err = block_rel_error(fixed.matrix(), &expected);
    assert!(err < 1e-6, "Earth fixed conversion error {err:e}");

    // And back into the inertial frame
    let fixed_orbit = orbit.in_frame(&Frame::earth_fixed());
    let jac_back = numerical_jacobian(&fixed_orbit, Frame::eme2000());
    let expected_back = jac_back * fixed.matrix() * jac_back.transpose();
    let back = fixed.change_frame(&fixed_orbit, Frame::eme2000()).unwrap();
    let err = block_rel_error(back.matrix(), &expected_back);
    assert!(err < 1e-6, "inertial conversion error {err:e}");
    assert!(mat_rel_error(back.matrix(), cov.matrix()) < 1e-12);
}

/// State of Vallado's covariance transformation worked example, in km and km/s.
fn vallado_orbit() -> Orbit {
    Orbit::cartesian(
        -605.79221660,
        -5870.22951108,
        3493.05319896,
        -1.56825429,
        -3.70234891,
        -6.47948395,
        Epoch::from_gregorian_utc(2000, 12, 15, 16, 58, 50, 208_000_000),
        Frame::eme2000(),
    )
}

/// Builds the DCM from the inertial frame into the local frame whose axes are provided as rows.
fn dcm_from_axes(x: Vector3<f64>, y: Vector3<f64>, z: Vector3<f64>) -> Matrix3<f64> {
    Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()])
}

#[test]
fn vallado_rtn_and_ntw_by_hand() {
    let orbit = vallado_orbit();
    let cov = Covariance::new(
        correlated_matrix(),
        orbit.epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    );

    let r_hat = orbit.radius().normalize();
    let v_hat = orbit.velocity().normalize();
    let h_hat = orbit.radius().cross(&orbit.velocity()).normalize();
    let rtn = dcm_from_axes(r_hat, h_hat.cross(&r_hat), h_hat);
    let ntw = dcm_from_axes(v_hat.cross(&h_hat), v_hat, h_hat);

    for (kind, dcm) in [(LocalFrame::RIC, rtn), (LocalFrame::NTW, ntw)] {
        // Frozen frame: the same rotation on both blocks
        let mut jac = Matrix6::zeros();
        jac.fixed_view_mut::<3, 3>(0, 0).copy_from(&dcm);
        jac.fixed_view_mut::<3, 3>(3, 3).copy_from(&dcm);
        let expected = jac * cov.matrix() * jac.transpose();
        let frozen = cov
            .change_local_frame(&orbit, LocalOrbitalFrame::inertial(kind))
            .unwrap();
        let err = block_rel_error(frozen.matrix(), &expected);
        assert!(err < 1e-12, "inertial {kind} error {err:e}");

        // Rotating frame: the velocity is relative to the frame rotating at h / r²
        let omega = orbit.radius().cross(&orbit.velocity()) / orbit.rmag_km().powi(2);
        jac.fixed_view_mut::<3, 3>(3, 0)
            .copy_from(&(-dcm * tilde_matrix(&omega)));
        let expected = jac * cov.matrix() * jac.transpose();
        let rotating = cov
            .change_local_frame(&orbit, LocalOrbitalFrame::rotating(kind))
            .unwrap();
        let err = block_rel_error(rotating.matrix(), &expected);
        assert!(err < 1e-12, "rotating {kind} error {err:e}");
    }
}

#[rstest]
fn non_cartesian_in_rotating_frame_is_rejected(orbit: Orbit) {
    let fixed_orbit = orbit.in_frame(&Frame::earth_fixed());
    for orbit_type in all::<OrbitType>().filter(|t| *t != OrbitType::Cartesian) {
        for angle in all::<PositionAngle>() {
            let cov = Covariance::new(
                correlated_matrix(),
                orbit.epoch,
                Frame::earth_fixed(),
                orbit_type,
                angle,
            );
            let errors = [
                cov.change_frame(&fixed_orbit, Frame::eme2000()),
                cov.change_local_frame(&fixed_orbit, LocalOrbitalFrame::rotating(LocalFrame::RIC)),
                cov.change_type(&fixed_orbit, OrbitType::Cartesian, PositionAngle::True),
                cov.shifted_by(&fixed_orbit, nyx::time::Duration::ZERO),
            ];
            for result in errors {
                assert!(
                    matches!(
                        result,
                        Err(CovarianceError::IncompatibleRepresentation { .. })
                    ),
                    "{orbit_type} ({angle}) should not convert: {result:?}"
                );
            }
        }

        // An inertial covariance of that type cannot go to a rotating frame either.
        let cov = Covariance::new(
            correlated_matrix(),
            orbit.epoch,
            Frame::eme2000(),
            OrbitType::Cartesian,
            PositionAngle::True,
        )
        .change_type(&orbit, orbit_type, PositionAngle::Eccentric)
        .unwrap();
        assert!(matches!(
            cov.change_frame(&orbit, Frame::earth_fixed()),
            Err(CovarianceError::IncompatibleRepresentation { .. })
        ));
        // But it can reach a local orbital frame, through Cartesian.
        let ric = cov
            .change_local_frame(&orbit, LocalOrbitalFrame::rotating(LocalFrame::RIC))
            .unwrap();
        assert_eq!(ric.orbit_type(), OrbitType::Cartesian);
    }
}

#[rstest]
fn type_change_in_local_frame_is_rejected(orbit: Orbit) {
    let lof = LocalOrbitalFrame::rotating(LocalFrame::LVLH);
    let cov = Covariance::in_local_frame(correlated_matrix(), orbit.epoch, lof);
    for orbit_type in all::<OrbitType>().filter(|t| *t != OrbitType::Cartesian) {
        assert_eq!(
            cov.change_type(&orbit, orbit_type, PositionAngle::True),
            Err(CovarianceError::TypeChangeInLocalFrame { lof })
        );
    }
}

#[rstest]
fn element_round_trips(orbit: Orbit) {
    let cov = Covariance::new(
        correlated_matrix(),
        orbit.epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    );
    for orbit_type in all::<OrbitType>() {
        for angle in all::<PositionAngle>() {
            let back = cov
                .change_type(&orbit, orbit_type, angle)
                .unwrap()
                .change_frame(&orbit, teme_like())
                .unwrap()
                .change_type(&orbit, OrbitType::Cartesian, PositionAngle::True)
                .unwrap()
                .change_frame(&orbit, Frame::eme2000())
                .unwrap();
            let err = mat_rel_error(back.matrix(), cov.matrix());
            assert!(err < 1e-7, "{orbit_type} ({angle}) round trip error {err:e}");
        }
    }
}
