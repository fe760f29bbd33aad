use nyx_covariance::cosmic::{EulerRotation, Frame, EARTH_GM_KM3_S2};
use nyx_covariance::linalg::Matrix6;
use nyx_covariance::time::Epoch;
use nyx_covariance::Orbit;

mod frames;
mod interpolation;
mod provider;

/// A pseudo inertial frame rotated away from EME2000, similar in spirit to TEME.
pub(crate) fn teme_like() -> Frame {
    Frame::from_euler(
        "TEME",
        EARTH_GM_KM3_S2,
        &[
            EulerRotation::r3_from_degrees(0.35),
            EulerRotation::r1_from_degrees(-0.12),
        ],
    )
}

pub(crate) fn leo_orbit() -> Orbit {
    Orbit::keplerian(
        6_978.0,
        0.0012,
        51.6,
        210.0,
        35.0,
        80.0,
        Epoch::from_gregorian_utc_at_noon(2026, 3, 14),
        Frame::eme2000(),
    )
}

/// A full, symmetric positive definite covariance with correlations, in km and km/s.
pub(crate) fn correlated_matrix() -> Matrix6<f64> {
    let sigmas = [0.1, 0.2, 0.15, 1e-4, 2e-4, 1.5e-4];
    Matrix6::from_fn(|i, j| {
        let rho = if i == j {
            1.0
        } else {
            0.1 + 0.05 * ((i + j) % 3) as f64
        };
        rho * sigmas[i] * sigmas[j]
    })
}
