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

use super::{AstroError, Frame, NonInertialFrameSnafu, State, TimeTagged};
use crate::linalg::{Const, Matrix6, OVector, Vector3, Vector6};
use crate::time::{Duration, Epoch, Unit};
use crate::utils::{between_0_360, between_0_tau};
use snafu::ensure;
use std::f64::consts::TAU;
use std::fmt;

/// If an orbit has an eccentricity below the following value, it is considered circular (only affects warning messages)
pub const ECC_EPSILON: f64 = 1e-11;

/// Tolerance on the mean anomaly when solving Kepler's equation
const MA_EPSILON: f64 = 1e-16;

/// Orbit defines an orbital state
///
/// Unless noted otherwise, algorithms are from GMAT 2016a [StateConversionUtil.cpp](https://github.com/ChristopherRabotin/GMAT/blob/37201a6290e7f7b941bc98ee973a527a5857104b/src/base/util/StateConversionUtil.cpp).
/// Regardless of the constructor used, this struct stores all the state information in Cartesian coordinates
/// as these are always non singular.
#[derive(Copy, Clone, Debug)]
pub struct Orbit {
    /// in km
    pub x_km: f64,
    /// in km
    pub y_km: f64,
    /// in km
    pub z_km: f64,
    /// in km/s
    pub vx_km_s: f64,
    /// in km/s
    pub vy_km_s: f64,
    /// in km/s
    pub vz_km_s: f64,
    pub epoch: Epoch,
    /// Frame in which this state is expressed, also provides the gravitational parameter
    pub frame: Frame,
    /// Optionally stores the state transition matrix from the start of the propagation until the current time (i.e. trajectory STM, not step-size STM)
    pub stm: Option<Matrix6<f64>>,
}

impl Orbit {
    /// Creates a new Orbit in the provided frame at the provided Epoch.
    ///
    /// **Units:** km, km, km, km/s, km/s, km/s
    #[allow(clippy::too_many_arguments)]
    pub fn cartesian(
        x_km: f64,
        y_km: f64,
        z_km: f64,
        vx_km_s: f64,
        vy_km_s: f64,
        vz_km_s: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        Self {
            x_km,
            y_km,
            z_km,
            vx_km_s,
            vy_km_s,
            vz_km_s,
            epoch,
            frame,
            stm: None,
        }
    }

    /// Creates a new Orbit from the position and velocity vectors.
    pub fn from_position_velocity(
        radius_km: &Vector3<f64>,
        velocity_km_s: &Vector3<f64>,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        Self::cartesian(
            radius_km[0],
            radius_km[1],
            radius_km[2],
            velocity_km_s[0],
            velocity_km_s[1],
            velocity_km_s[2],
            epoch,
            frame,
        )
    }

    /// Creates a new Orbit in the provided frame from the borrowed state vector
    ///
    /// The state vector **must** be x, y, z, vx, vy, vz.
    pub fn cartesian_vec(state: &Vector6<f64>, epoch: Epoch, frame: Frame) -> Self {
        Self::cartesian(
            state[0], state[1], state[2], state[3], state[4], state[5], epoch, frame,
        )
    }

    /// Creates a new Orbit around the provided frame from the Keplerian orbital elements.
    ///
    /// **Units:** km, none, degrees, degrees, degrees, degrees
    ///
    /// NOTE: The state is defined in Cartesian coordinates as they are non-singular. This causes rounding
    /// errors when creating a state from its Keplerian orbital elements.
    /// One should expect these errors to be on the order of 1e-12.
    #[allow(clippy::too_many_arguments)]
    pub fn keplerian(
        sma_km: f64,
        ecc: f64,
        inc_deg: f64,
        raan_deg: f64,
        aop_deg: f64,
        ta_deg: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        let gm = frame.mu_km3_s2();
        if gm.abs() < f64::EPSILON {
            warn!("GM is near zero ({gm}): expect math errors in Keplerian to Cartesian conversion");
        }
        // Algorithm from GMAT's StateConversionUtil::KeplerianToCartesian
        let ecc = if ecc < 0.0 {
            warn!("eccentricity cannot be negative: sign of eccentricity changed");
            -ecc
        } else {
            ecc
        };
        let sma = if (ecc > 1.0 && sma_km > 0.0) || (ecc < 1.0 && sma_km < 0.0) {
            warn!("eccentricity ({ecc}) and SMA ({sma_km} km) are inconsistent: sign of SMA changed");
            -sma_km
        } else {
            sma_km
        };
        if (1.0 - ecc).abs() < f64::EPSILON {
            warn!("parabolic orbits have ill-defined Keplerian orbital elements");
        }

        let inc = inc_deg.to_radians();
        let raan = raan_deg.to_radians();
        let aop = aop_deg.to_radians();
        let ta = ta_deg.to_radians();
        let p = sma * (1.0 - ecc.powi(2));
        let radius = p / (1.0 + ecc * ta.cos());
        let (sin_aop_ta, cos_aop_ta) = (aop + ta).sin_cos();
        let (sin_inc, cos_inc) = inc.sin_cos();
        let (sin_raan, cos_raan) = raan.sin_cos();
        let (sin_aop, cos_aop) = aop.sin_cos();
        let x = radius * (cos_aop_ta * cos_raan - cos_inc * sin_aop_ta * sin_raan);
        let y = radius * (cos_aop_ta * sin_raan + cos_inc * sin_aop_ta * cos_raan);
        let z = radius * sin_aop_ta * sin_inc;
        let sqrt_gm_p = (gm / p).sqrt();
        let cos_ta_ecc = ta.cos() + ecc;
        let sin_ta = ta.sin();

        let vx = sqrt_gm_p * cos_ta_ecc * (-sin_aop * cos_raan - cos_inc * sin_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * cos_raan - cos_inc * sin_raan * sin_aop);
        let vy = sqrt_gm_p * cos_ta_ecc * (-sin_aop * sin_raan + cos_inc * cos_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * sin_raan + cos_inc * cos_raan * sin_aop);
        let vz = sqrt_gm_p * (cos_ta_ecc * sin_inc * cos_aop - sin_ta * sin_inc * sin_aop);

        Self::cartesian(x, y, z, vx, vy, vz, epoch, frame)
    }

    /// Creates a new Orbit from the Keplerian orbital elements using the mean anomaly instead of the true anomaly.
    ///
    /// **Units:** km, none, degrees, degrees, degrees, degrees
    #[allow(clippy::too_many_arguments)]
    pub fn keplerian_mean_anomaly(
        sma_km: f64,
        ecc: f64,
        inc_deg: f64,
        raan_deg: f64,
        aop_deg: f64,
        ma_deg: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        let ta_rad = mean_to_true_anomaly_rad(ma_deg.to_radians(), ecc)?;

        Ok(Self::keplerian(
            sma_km,
            ecc,
            inc_deg,
            raan_deg,
            aop_deg,
            ta_rad.to_degrees(),
            epoch,
            frame,
        ))
    }

    /// Returns the radius vector of this Orbit in [km, km, km]
    pub fn radius(&self) -> Vector3<f64> {
        Vector3::new(self.x_km, self.y_km, self.z_km)
    }

    /// Returns the velocity vector of this Orbit in [km/s, km/s, km/s]
    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::new(self.vx_km_s, self.vy_km_s, self.vz_km_s)
    }

    /// Returns this state as a Cartesian Vector6 in [km, km, km, km/s, km/s, km/s]
    ///
    /// Note that the time is **not** returned in the vector.
    pub fn to_cartesian_vec(self) -> Vector6<f64> {
        Vector6::new(
            self.x_km,
            self.y_km,
            self.z_km,
            self.vx_km_s,
            self.vy_km_s,
            self.vz_km_s,
        )
    }

    /// Returns the magnitude of the radius vector in km
    pub fn rmag_km(&self) -> f64 {
        self.radius().norm()
    }

    /// Returns the magnitude of the velocity vector in km/s
    pub fn vmag_km_s(&self) -> f64 {
        self.velocity().norm()
    }

    /// Returns the orbital momentum vector
    pub fn hvec(&self) -> Vector3<f64> {
        self.radius().cross(&self.velocity())
    }

    /// Returns the norm of the orbital momentum
    pub fn hmag_km2_s(&self) -> f64 {
        self.hvec().norm()
    }

    /// Returns the eccentricity vector (no unit)
    pub fn evec(&self) -> Vector3<f64> {
        let gm = self.frame.mu_km3_s2();
        let r = self.radius();
        let v = self.velocity();
        ((v.norm_squared() - gm / r.norm()) * r - (r.dot(&v)) * v) / gm
    }

    /// Returns the specific mechanical energy in km^2/s^2
    pub fn energy_km2_s2(&self) -> f64 {
        self.vmag_km_s().powi(2) / 2.0 - self.frame.mu_km3_s2() / self.rmag_km()
    }

    /// Returns the semi-major axis in km
    pub fn sma_km(&self) -> f64 {
        -self.frame.mu_km3_s2() / (2.0 * self.energy_km2_s2())
    }

    /// Returns the eccentricity (no unit)
    pub fn ecc(&self) -> f64 {
        self.evec().norm()
    }

    /// Returns the inclination in degrees
    pub fn inc_deg(&self) -> f64 {
        (self.hvec()[2] / self.hmag_km2_s()).acos().to_degrees()
    }

    /// Returns the right ascension of the ascending node in degrees
    pub fn raan_deg(&self) -> f64 {
        let h = self.hvec();
        between_0_360(h[0].atan2(-h[1]).to_degrees())
    }

    /// Returns the argument of latitude in degrees, i.e. the angle from the ascending node to the position vector.
    pub fn aol_deg(&self) -> f64 {
        let h_hat = self.hvec() / self.hmag_km2_s();
        let raan = self.raan_deg().to_radians();
        let n_hat = Vector3::new(raan.cos(), raan.sin(), 0.0);
        let q_hat = h_hat.cross(&n_hat);
        let r = self.radius();
        between_0_360(r.dot(&q_hat).atan2(r.dot(&n_hat)).to_degrees())
    }

    /// Returns the true anomaly in degrees between 0 and 360.0
    pub fn ta_deg(&self) -> f64 {
        if self.ecc() < ECC_EPSILON {
            warn!("true anomaly ill-defined for circular orbit (e = {})", self.ecc());
        }
        let gm = self.frame.mu_km3_s2();
        let h = self.hmag_km2_s();
        let r = self.radius();
        let e_sin_ta = h * r.dot(&self.velocity()) / gm;
        let e_cos_ta = h.powi(2) / gm - self.rmag_km();
        between_0_360(e_sin_ta.atan2(e_cos_ta).to_degrees())
    }

    /// Returns the argument of periapsis in degrees
    pub fn aop_deg(&self) -> f64 {
        between_0_360(self.aol_deg() - self.ta_deg())
    }

    /// Returns the eccentric anomaly in degrees
    ///
    /// This is a conversion from GMAT's StateConversionUtil::TrueToEccentricAnomaly
    pub fn ea_deg(&self) -> f64 {
        let ecc = self.ecc();
        let (sin_ta, cos_ta) = self.ta_deg().to_radians().sin_cos();
        let ecc_cos_ta = ecc * cos_ta;
        let sin_ea = ((1.0 - ecc.powi(2)).sqrt() * sin_ta) / (1.0 + ecc_cos_ta);
        let cos_ea = (ecc + cos_ta) / (1.0 + ecc_cos_ta);
        between_0_360(sin_ea.atan2(cos_ea).to_degrees())
    }

    /// Returns the mean anomaly in degrees
    ///
    /// This is a conversion from GMAT's StateConversionUtil::TrueToMeanAnomaly
    pub fn ma_deg(&self) -> Result<f64, AstroError> {
        let ecc = self.ecc();
        ensure!(
            ecc < 1.0,
            super::NotEllipticalSnafu {
                ecc,
                action: "mean anomaly"
            }
        );
        let ea_rad = self.ea_deg().to_radians();
        Ok(between_0_360((ea_rad - ecc * ea_rad.sin()).to_degrees()))
    }

    /// Returns the mean motion in radians per second
    pub fn mean_motion_rad_s(&self) -> f64 {
        (self.frame.mu_km3_s2() / self.sma_km().powi(3)).sqrt()
    }

    /// Returns the period
    pub fn period(&self) -> Duration {
        (TAU / self.mean_motion_rad_s()) * Unit::Second
    }

    /// Returns this orbit expressed in the provided frame, applying the transport theorem to the velocity.
    /// The STM, if any, is dropped because it is only valid in the frame it was propagated in.
    pub fn in_frame(&self, frame: &Frame) -> Self {
        if self.frame == *frame {
            return *self;
        }
        let xf = self.frame.transform_to(frame, self.epoch);
        let (radius, velocity) = xf.apply(&self.radius(), &self.velocity());
        Self::from_position_velocity(&radius, &velocity, self.epoch, *frame)
    }

    /// Returns a copy of this orbit propagated to the new epoch using two body dynamics (Kepler's equation).
    ///
    /// # Astrodynamics note
    /// The frame must be inertial and the orbit elliptical.
    pub fn at_epoch(&self, new_epoch: Epoch) -> Result<Self, AstroError> {
        ensure!(
            self.frame.is_inertial(),
            NonInertialFrameSnafu {
                frame: self.frame.name,
                action: "Keplerian propagation"
            }
        );
        let m0_rad = self.ma_deg()?.to_radians();
        let mt_rad = m0_rad + self.mean_motion_rad_s() * (new_epoch - self.epoch).to_seconds();

        Self::keplerian_mean_anomaly(
            self.sma_km(),
            self.ecc(),
            self.inc_deg(),
            self.raan_deg(),
            self.aop_deg(),
            between_0_tau(mt_rad).to_degrees(),
            new_epoch,
            self.frame,
        )
    }

    /// Copies the current state but sets the STM to identity
    pub fn with_stm(self) -> Self {
        let mut me = self;
        me.enable_stm();
        me
    }

    /// Copies the current state but disables the STM
    pub fn without_stm(self) -> Self {
        let mut me = self;
        me.disable_stm();
        me
    }

    /// Sets the STM to identity
    pub fn enable_stm(&mut self) {
        self.stm = Some(Matrix6::identity());
    }

    /// Removes the STM
    pub fn disable_stm(&mut self) {
        self.stm = None;
    }

    /// Returns whether this orbit and another are equal within the specified radial and velocity absolute tolerances
    pub fn eq_within(&self, other: &Self, radial_tol_km: f64, velocity_tol_km_s: f64) -> bool {
        self.epoch == other.epoch
            && self.frame == other.frame
            && (self.radius() - other.radius()).amax() < radial_tol_km
            && (self.velocity() - other.velocity()).amax() < velocity_tol_km_s
    }
}

/// Computes the true anomaly from the mean anomaly by solving Kepler's equation with Newton-Raphson.
pub(crate) fn mean_to_true_anomaly_rad(ma_rad: f64, ecc: f64) -> Result<f64, AstroError> {
    ensure!(
        (0.0..1.0).contains(&ecc),
        super::NotEllipticalSnafu {
            ecc,
            action: "Kepler's equation"
        }
    );
    let ma_rad = between_0_tau(ma_rad);
    let mut ea_rad = if ecc > 0.8 { std::f64::consts::PI } else { ma_rad };
    let mut iter = 0;
    loop {
        iter += 1;
        if iter > 1000 {
            return Err(AstroError::MaxIterReached { iter });
        }
        let normalizer = 1.0 - ecc * ea_rad.cos();
        if normalizer.abs() < f64::EPSILON {
            return Err(AstroError::MathDomain {
                msg: format!("normalizer too small {normalizer}"),
            });
        }
        let delta = (ea_rad - ecc * ea_rad.sin() - ma_rad) / normalizer;
        ea_rad -= delta;
        if delta.abs() < MA_EPSILON.max(f64::EPSILON * ea_rad.abs()) {
            break;
        }
    }
    let (sin_ea, cos_ea) = ea_rad.sin_cos();
    Ok(((1.0 - ecc.powi(2)).sqrt() * sin_ea).atan2(cos_ea - ecc))
}

impl PartialEq for Orbit {
    /// Two states are equal if their position are equal within one centimeter and their velocities within one centimeter per second.
    fn eq(&self, other: &Orbit) -> bool {
        self.eq_within(other, 1e-5, 1e-5)
    }
}

impl TimeTagged for Orbit {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl State for Orbit {
    type VecLength = Const<42>;

    /// The vector stores the Cartesian state followed by the STM in column major order (zeros if the STM is disabled).
    fn to_vector(&self) -> OVector<f64, Const<42>> {
        let mut as_vec = OVector::<f64, Const<42>>::zeros();
        as_vec[0] = self.x_km;
        as_vec[1] = self.y_km;
        as_vec[2] = self.z_km;
        as_vec[3] = self.vx_km_s;
        as_vec[4] = self.vy_km_s;
        as_vec[5] = self.vz_km_s;
        if let Some(stm) = self.stm {
            for (idx, stm_val) in stm.as_slice().iter().enumerate() {
                as_vec[idx + 6] = *stm_val;
            }
        }
        as_vec
    }

    fn set(&mut self, epoch: Epoch, vector: &OVector<f64, Const<42>>) {
        self.set_epoch(epoch);
        self.x_km = vector[0];
        self.y_km = vector[1];
        self.z_km = vector[2];
        self.vx_km_s = vector[3];
        self.vy_km_s = vector[4];
        self.vz_km_s = vector[5];
        if self.stm.is_some() {
            self.stm = Some(Matrix6::from_column_slice(&vector.as_slice()[6..]));
        }
    }

    fn stm(&self) -> Result<Matrix6<f64>, AstroError> {
        self.stm.ok_or(AstroError::StateTransitionMatrixUnset)
    }

    fn reset_stm(&mut self) {
        self.enable_stm();
    }

    fn unset_stm(&mut self) {
        self.disable_stm();
    }
}

#[allow(clippy::format_in_format_args)]
impl fmt::Display for Orbit {
    // Prints as Cartesian in floating point with units
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let decimals = f.precision().unwrap_or(6);
        write!(
            f,
            "[{}] {}\tposition = [{}, {}, {}] km\tvelocity = [{}, {}, {}] km/s",
            self.frame,
            self.epoch,
            format!("{:.*}", decimals, self.x_km),
            format!("{:.*}", decimals, self.y_km),
            format!("{:.*}", decimals, self.z_km),
            format!("{:.*}", decimals, self.vx_km_s),
            format!("{:.*}", decimals, self.vy_km_s),
            format!("{:.*}", decimals, self.vz_km_s)
        )
    }
}

#[allow(clippy::format_in_format_args)]
impl fmt::LowerHex for Orbit {
    // Prints the Keplerian orbital elements in floating point with units
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let decimals = f.precision().unwrap_or(6);
        write!(
            f,
            "[{}] {}\tsma = {} km\tecc = {}\tinc = {} deg\traan = {} deg\taop = {} deg\tta = {} deg",
            self.frame,
            self.epoch,
            format!("{:.*}", decimals, self.sma_km()),
            format!("{:.*}", decimals, self.ecc()),
            format!("{:.*}", decimals, self.inc_deg()),
            format!("{:.*}", decimals, self.raan_deg()),
            format!("{:.*}", decimals, self.aop_deg()),
            format!("{:.*}", decimals, self.ta_deg()),
        )
    }
}
