extern crate nyx_covariance as nyx;

use super::{correlated_matrix, leo_orbit};
use nyx::cosmic::{Frame, LocalFrame, LocalOrbitalFrame, OrbitType, PositionAngle};
use nyx::covariance::interpolator::{
    AbsolutePv, CovarianceBlender, CovarianceInterpolator, CovarianceOutput, DerivativeFilter,
    InterpolationCfg, InterpolationSample, KeplerianHermiteInterpolator, SampleState,
    MIXED_STATES_MSG, NO_PV_INTERPOLATOR_MSG,
};
use nyx::covariance::{Covariance, CovarianceError};
use nyx::linalg::Vector3;
use nyx::time::{Duration, Unit};
use nyx::utils::mat_rel_error;
use nyx::Orbit;
use rstest::*;

/// Reference covariance at the first sample epoch, shifted with the Keplerian model to every other sample.
fn reference() -> (Orbit, Covariance) {
    let orbit = leo_orbit();
    let cov = Covariance::new(
        correlated_matrix(),
        orbit.epoch,
        Frame::eme2000(),
        OrbitType::Cartesian,
        PositionAngle::True,
    );
    (orbit, cov)
}

#[fixture]
fn samples() -> Vec<InterpolationSample> {
    let (orbit, cov) = reference();
    (0..5_i64)
        .map(|i| {
            let dt = (60 * i) * Unit::Second;
            let shifted_orbit = orbit.at_epoch(orbit.epoch + dt).unwrap();
            let shifted_cov = cov.shifted_by(&orbit, dt).unwrap();
            InterpolationSample::new(shifted_orbit, shifted_cov)
        })
        .collect()
}

fn hermite(samples: usize, filter: DerivativeFilter) -> KeplerianHermiteInterpolator {
    KeplerianHermiteInterpolator::new(
        InterpolationCfg::builder()
            .samples(samples)
            .filter(filter)
            .build(),
        CovarianceOutput::cartesian(Frame::eme2000()),
    )
}

#[rstest]
fn hermite_at_sample_epochs(samples: Vec<InterpolationSample>) {
    let interp = hermite(3, DerivativeFilter::FirstDerivative);
    for sample in &samples {
        let (orbit, cov) = interp.interpolate(sample.epoch(), &samples).unwrap();
        assert_eq!(cov.epoch(), sample.epoch());
        assert_eq!(cov.frame(), Some(Frame::eme2000()));
        assert_eq!(cov.orbit_type(), OrbitType::Cartesian);
        let err = mat_rel_error(cov.matrix(), sample.covariance.matrix());
        assert!(err < 1e-8, "relative error {err:e} at {}", sample.epoch());
        if let SampleState::Orbit(expected) = sample.state {
            assert!((orbit.radius() - expected.radius()).norm() < 1e-9);
        }
    }
}

#[rstest]
#[case(DerivativeFilter::Values, 4)]
#[case(DerivativeFilter::FirstDerivative, 2)]
#[case(DerivativeFilter::FirstDerivative, 3)]
#[case(DerivativeFilter::SecondDerivative, 2)]
fn hermite_between_samples(
    samples: Vec<InterpolationSample>,
    #[case] filter: DerivativeFilter,
    #[case] count: usize,
) {
    let (orbit, cov) = reference();
    let epoch = orbit.epoch + 150 * Unit::Second;
    let expected = cov.shifted_by(&orbit, 150 * Unit::Second).unwrap();

    let (interp_orbit, interp_cov) = hermite(count, filter).interpolate(epoch, &samples).unwrap();
    let truth = orbit.at_epoch(epoch).unwrap();
    assert!((interp_orbit.radius() - truth.radius()).norm() < 1e-2);

    let err = mat_rel_error(interp_cov.matrix(), expected.matrix());
    assert!(err < 1e-4, "{filter:?} with {count} samples: relative error {err:e}");
}

#[rstest]
fn blender_matches_keplerian_shift(samples: Vec<InterpolationSample>) {
    let (orbit, cov) = reference();
    let blender = CovarianceBlender::new(
        InterpolationCfg::default(),
        CovarianceOutput::cartesian(Frame::eme2000()),
    );

    // At a sample epoch, the blend is the sample itself.
    let (_, at_node) = blender.interpolate(samples[2].epoch(), &samples).unwrap();
    assert!(mat_rel_error(at_node.matrix(), samples[2].covariance.matrix()) < 1e-7);

    let epoch = orbit.epoch + 100 * Unit::Second;
    let expected = cov.shifted_by(&orbit, 100 * Unit::Second).unwrap();
    let (blended_orbit, blended) = blender.interpolate(epoch, &samples).unwrap();
    let truth = orbit.at_epoch(epoch).unwrap();
    assert!((blended_orbit.radius() - truth.radius()).norm() < 1e-6);
    let err = mat_rel_error(blended.matrix(), expected.matrix());
    assert!(err < 1e-6, "relative error {err:e}");

    // Local frame output
    let lof = LocalOrbitalFrame::rotating(LocalFrame::TNW);
    let blender = blender.with_local_frame(LocalOrbitalFrame::inertial(LocalFrame::NTW));
    let blender = CovarianceBlender {
        output: CovarianceOutput::Local(lof),
        ..blender
    };
    let (_, local) = blender.interpolate(epoch, &samples).unwrap();
    assert_eq!(local.local_frame(), Some(lof));
}

#[rstest]
fn interpolation_errors(samples: Vec<InterpolationSample>) {
    let interp = hermite(2, DerivativeFilter::FirstDerivative);
    let epoch = samples[0].epoch();

    assert_eq!(
        interp.interpolate(epoch, &[]),
        Err(CovarianceError::InsufficientSamples {
            count: 0,
            needed: 2
        })
    );

    // A configuration without any sample is rejected instead of underflowing the window
    assert_eq!(
        hermite(0, DerivativeFilter::Values).interpolate(epoch, &samples),
        Err(CovarianceError::InsufficientSamples {
            count: samples.len(),
            needed: 1
        })
    );

    let pv = AbsolutePv {
        epoch: samples[1].epoch(),
        frame: Frame::eme2000(),
        position_km: Vector3::new(7000.0, 0.0, 0.0),
        velocity_km_s: Vector3::new(0.0, 7.5, 0.0),
        acceleration_km_s2: Vector3::zeros(),
    };
    let pv_sample = InterpolationSample {
        state: SampleState::AbsolutePv(pv),
        covariance: samples[1].covariance,
    };
    match interp.interpolate(epoch, &[samples[0], pv_sample]) {
        Err(CovarianceError::MismatchedStateDefinitions { msg }) => {
            assert_eq!(msg, MIXED_STATES_MSG)
        }
        other => panic!("expected mixed states error, got {other:?}"),
    }
    let mut first_pv = pv_sample;
    if let SampleState::AbsolutePv(ref mut pv) = first_pv.state {
        pv.epoch = epoch;
    }
    match CovarianceBlender::new(
        InterpolationCfg::default(),
        CovarianceOutput::cartesian(Frame::eme2000()),
    )
    .interpolate(epoch, &[first_pv, pv_sample])
    {
        Err(CovarianceError::MismatchedStateDefinitions { msg }) => {
            assert_eq!(msg, NO_PV_INTERPOLATOR_MSG)
        }
        other => panic!("expected no PV interpolator error, got {other:?}"),
    }

    let last = samples[samples.len() - 1].epoch();
    assert!(matches!(
        interp.interpolate(last + 1 * Unit::Second, &samples),
        Err(CovarianceError::ExtrapolationBeyondThreshold { .. })
    ));
    let tolerant = KeplerianHermiteInterpolator::new(
        InterpolationCfg::builder()
            .extrapolation_threshold(Duration::from_seconds(30.0))
            .build(),
        CovarianceOutput::cartesian(Frame::eme2000()),
    );
    assert!(tolerant
        .interpolate(last + 10 * Unit::Second, &samples)
        .is_ok());

    let mut unordered = samples.clone();
    unordered.swap(1, 2);
    assert!(matches!(
        interp.interpolate(epoch, &unordered),
        Err(CovarianceError::NonIncreasingEpochs { .. })
    ));
}
