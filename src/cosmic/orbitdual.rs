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

use super::elements::{OrbitType, PositionAngle};
use super::{AstroError, Frame, NotEllipticalSnafu, Orbit};
use crate::linalg::{Vector3, U7};
use crate::time::Epoch;
use hyperdual::linalg::norm;
use hyperdual::{Float, OHyperdual};
use snafu::ensure;
use std::fmt;

type Dual = OHyperdual<f64, U7>;

/// Orbit where each Cartesian component is a hyperdual number seeded with its own partial.
///
/// Every orbital element computed from an OrbitDual therefore carries its partial derivatives
/// with respect to X, Y, Z, VX, VY, VZ in its dual parts, which is how the Jacobians of the
/// element sets are computed without finite differencing.
#[derive(Copy, Clone, Debug)]
pub struct OrbitDual {
    /// in km
    pub x: Dual,
    /// in km
    pub y: Dual,
    /// in km
    pub z: Dual,
    /// in km/s
    pub vx: Dual,
    /// in km/s
    pub vy: Dual,
    /// in km/s
    pub vz: Dual,
    pub epoch: Epoch,
    pub frame: Frame,
}

impl From<Orbit> for OrbitDual {
    /// Initialize a new OrbitDual from an orbit, no other initializers
    fn from(orbit: Orbit) -> Self {
        Self {
            x: OHyperdual::from_slice(&[orbit.x_km, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            y: OHyperdual::from_slice(&[orbit.y_km, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]),
            z: OHyperdual::from_slice(&[orbit.z_km, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]),
            vx: OHyperdual::from_slice(&[orbit.vx_km_s, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
            vy: OHyperdual::from_slice(&[orbit.vy_km_s, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
            vz: OHyperdual::from_slice(&[orbit.vz_km_s, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
            epoch: orbit.epoch,
            frame: orbit.frame,
        }
    }
}

/// A type which stores the partial of an element
#[derive(Copy, Clone, Debug)]
pub struct OrbitPartial {
    pub name: &'static str,
    pub dual: Dual,
}

impl OrbitPartial {
    /// Returns the real value of this parameter
    pub fn real(&self) -> f64 {
        self.dual[0]
    }
    /// The partial of this parameter with respect to X
    pub fn wtr_x(&self) -> f64 {
        self.dual[1]
    }
    /// The partial of this parameter with respect to Y
    pub fn wtr_y(&self) -> f64 {
        self.dual[2]
    }
    /// The partial of this parameter with respect to Z
    pub fn wtr_z(&self) -> f64 {
        self.dual[3]
    }
    /// The partial of this parameter with respect to VX
    pub fn wtr_vx(&self) -> f64 {
        self.dual[4]
    }
    /// The partial of this parameter with respect to VY
    pub fn wtr_vy(&self) -> f64 {
        self.dual[5]
    }
    /// The partial of this parameter with respect to VZ
    pub fn wtr_vz(&self) -> f64 {
        self.dual[6]
    }
    /// Returns the gradient of this parameter with respect to the Cartesian state
    pub fn gradient(&self) -> [f64; 6] {
        [
            self.wtr_x(),
            self.wtr_y(),
            self.wtr_z(),
            self.wtr_vx(),
            self.wtr_vy(),
            self.wtr_vz(),
        ]
    }
}

impl fmt::Display for OrbitPartial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.name, self.dual)
    }
}

fn dot(a: &Vector3<Dual>, b: &Vector3<Dual>) -> Dual {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn scale(v: &Vector3<Dual>, s: Dual) -> Vector3<Dual> {
    Vector3::new(v[0] * s, v[1] * s, v[2] * s)
}

fn partial(name: &'static str, dual: Dual) -> OrbitPartial {
    OrbitPartial { name, dual }
}

/// Converts a true longitude-like angle to its eccentric counterpart, for the (ex, ey) eccentricity vector components.
fn true_to_eccentric_longitude(ex: Dual, ey: Dual, alpha_v: Dual) -> Dual {
    let one = Dual::from(1.0);
    let two = Dual::from(2.0);
    let epsilon = (one - ex * ex - ey * ey).sqrt();
    let (sin_av, cos_av) = (alpha_v.sin(), alpha_v.cos());
    alpha_v
        + two * ((ey * cos_av - ex * sin_av) / (epsilon + one + ex * cos_av + ey * sin_av)).atan()
}

fn eccentric_to_mean_longitude(ex: Dual, ey: Dual, alpha_e: Dual) -> Dual {
    alpha_e - ex * alpha_e.sin() + ey * alpha_e.cos()
}

impl OrbitDual {
    /// Returns the radius vector of this Orbit in [km, km, km]
    pub(crate) fn radius(&self) -> Vector3<Dual> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Returns the velocity vector of this Orbit in [km/s, km/s, km/s]
    pub(crate) fn velocity(&self) -> Vector3<Dual> {
        Vector3::new(self.vx, self.vy, self.vz)
    }

    /// Returns the orbital momentum vector
    pub(crate) fn hvec(&self) -> Vector3<Dual> {
        self.radius().cross(&self.velocity())
    }

    fn mu(&self) -> Dual {
        Dual::from(self.frame.mu_km3_s2())
    }

    /// Returns the magnitude of the radius vector in km
    pub fn rmag_km(&self) -> OrbitPartial {
        partial("rmag", norm(&self.radius()))
    }

    /// Returns the magnitude of the velocity vector in km/s
    pub fn vmag_km_s(&self) -> OrbitPartial {
        partial("vmag", norm(&self.velocity()))
    }

    /// Returns the norm of the orbital momentum
    pub fn hmag(&self) -> OrbitPartial {
        partial("hmag", norm(&self.hvec()))
    }

    /// Returns the specific mechanical energy
    pub fn energy_km2_s2(&self) -> OrbitPartial {
        partial(
            "energy",
            self.vmag_km_s().dual.powi(2) / Dual::from(2.0) - self.mu() / self.rmag_km().dual,
        )
    }

    /// Returns the semi-major axis in km
    pub fn sma_km(&self) -> OrbitPartial {
        partial(
            "sma",
            -self.mu() / (Dual::from(2.0) * self.energy_km2_s2().dual),
        )
    }

    /// Returns the eccentricity vector (no unit)
    pub(crate) fn evec(&self) -> Vector3<Dual> {
        let r = self.radius();
        let v = self.velocity();
        let mu = self.mu();
        let v2_mu_r = dot(&v, &v) - mu / norm(&r);
        let r_dot_v = dot(&r, &v);
        Vector3::new(
            (v2_mu_r * r[0] - r_dot_v * v[0]) / mu,
            (v2_mu_r * r[1] - r_dot_v * v[1]) / mu,
            (v2_mu_r * r[2] - r_dot_v * v[2]) / mu,
        )
    }

    /// Returns the eccentricity (no unit)
    pub fn ecc(&self) -> OrbitPartial {
        partial("ecc", norm(&self.evec()))
    }

    /// Returns the inclination in radians
    pub fn inc_rad(&self) -> OrbitPartial {
        partial("inc", (self.hvec()[2] / self.hmag().dual).acos())
    }

    /// Returns the right ascension of the ascending node in radians
    pub fn raan_rad(&self) -> OrbitPartial {
        let h = self.hvec();
        partial("raan", h[0].atan2(-h[1]))
    }

    /// Returns the unit vectors pointing to the ascending node and completing the in-plane basis
    fn node_basis(&self) -> (Vector3<Dual>, Vector3<Dual>) {
        let raan = self.raan_rad().dual;
        let n_hat = Vector3::new(raan.cos(), raan.sin(), Dual::from(0.0));
        let h_hat = scale(&self.hvec(), Dual::from(1.0) / self.hmag().dual);
        let q_hat = h_hat.cross(&n_hat);
        (n_hat, q_hat)
    }

    /// Returns the argument of latitude in radians
    pub fn aol_rad(&self) -> OrbitPartial {
        let (n_hat, q_hat) = self.node_basis();
        let r = self.radius();
        partial("aol", dot(&r, &q_hat).atan2(dot(&r, &n_hat)))
    }

    /// Returns the true anomaly in radians
    pub fn ta_rad(&self) -> OrbitPartial {
        let mu = self.mu();
        let h = self.hmag().dual;
        let e_sin_ta = h * dot(&self.radius(), &self.velocity()) / mu;
        let e_cos_ta = h * h / mu - self.rmag_km().dual;
        partial("ta", e_sin_ta.atan2(e_cos_ta))
    }

    /// Returns the argument of periapsis in radians
    pub fn aop_rad(&self) -> OrbitPartial {
        partial("aop", self.aol_rad().dual - self.ta_rad().dual)
    }

    /// Returns the eccentric anomaly in radians
    pub fn ea_rad(&self) -> Result<OrbitPartial, AstroError> {
        let ecc = self.ecc().dual;
        ensure!(
            ecc[0] < 1.0,
            NotEllipticalSnafu {
                ecc: ecc[0],
                action: "eccentric anomaly"
            }
        );
        let ta = self.ta_rad().dual;
        let sin_ea = (Dual::from(1.0) - ecc * ecc).sqrt() * ta.sin();
        let cos_ea = ecc + ta.cos();
        Ok(partial("ea", sin_ea.atan2(cos_ea)))
    }

    /// Returns the mean anomaly in radians
    pub fn ma_rad(&self) -> Result<OrbitPartial, AstroError> {
        let ecc = self.ecc().dual;
        let ea = self.ea_rad()?.dual;
        Ok(partial("ma", ea - ecc * ea.sin()))
    }

    /// Returns the Keplerian anomaly of the requested kind
    fn anomaly(&self, angle: PositionAngle) -> Result<OrbitPartial, AstroError> {
        match angle {
            PositionAngle::True => Ok(self.ta_rad()),
            PositionAngle::Eccentric => self.ea_rad(),
            PositionAngle::Mean => self.ma_rad(),
        }
    }

    /// Returns the (ex, ey) components of the eccentricity vector and the latitude argument of the circular parameters
    fn circular_parameters(&self, angle: PositionAngle) -> [OrbitPartial; 3] {
        let (n_hat, q_hat) = self.node_basis();
        let evec = self.evec();
        let ex = dot(&evec, &n_hat);
        let ey = dot(&evec, &q_hat);
        let alpha_v = self.aol_rad().dual;
        let alpha = match angle {
            PositionAngle::True => alpha_v,
            PositionAngle::Eccentric => true_to_eccentric_longitude(ex, ey, alpha_v),
            PositionAngle::Mean => {
                eccentric_to_mean_longitude(ex, ey, true_to_eccentric_longitude(ex, ey, alpha_v))
            }
        };
        [partial("ex", ex), partial("ey", ey), partial("alpha", alpha)]
    }

    /// Returns the (ex, ey, hx, hy, longitude) of the equinoctial parameters
    fn equinoctial_parameters(&self, angle: PositionAngle) -> [OrbitPartial; 5] {
        let one = Dual::from(1.0);
        let w = scale(&self.hvec(), one / self.hmag().dual);
        let d = one / (one + w[2]);
        let f_hat = Vector3::new(one - d * w[0] * w[0], -d * w[0] * w[1], -w[0]);
        let g_hat = Vector3::new(-d * w[0] * w[1], one - d * w[1] * w[1], -w[1]);
        let evec = self.evec();
        let ex = dot(&evec, &f_hat);
        let ey = dot(&evec, &g_hat);
        let r = self.radius();
        let lv = dot(&r, &g_hat).atan2(dot(&r, &f_hat));
        let lon = match angle {
            PositionAngle::True => lv,
            PositionAngle::Eccentric => true_to_eccentric_longitude(ex, ey, lv),
            PositionAngle::Mean => {
                eccentric_to_mean_longitude(ex, ey, true_to_eccentric_longitude(ex, ey, lv))
            }
        };
        [
            partial("ex", ex),
            partial("ey", ey),
            partial("hx", -d * w[1]),
            partial("hy", d * w[0]),
            partial("lon", lon),
        ]
    }

    /// Computes the six elements of the requested set, angles in radians, each with its partials.
    pub fn elements(
        &self,
        orbit_type: OrbitType,
        angle: PositionAngle,
    ) -> Result<[OrbitPartial; 6], AstroError> {
        if orbit_type != OrbitType::Cartesian {
            let ecc = self.ecc().real();
            ensure!(
                ecc < 1.0,
                NotEllipticalSnafu {
                    ecc,
                    action: "orbital element Jacobian"
                }
            );
        }
        match orbit_type {
            OrbitType::Cartesian => Ok([
                partial("x", self.x),
                partial("y", self.y),
                partial("z", self.z),
                partial("vx", self.vx),
                partial("vy", self.vy),
                partial("vz", self.vz),
            ]),
            OrbitType::Keplerian => Ok([
                self.sma_km(),
                self.ecc(),
                self.inc_rad(),
                self.aop_rad(),
                self.raan_rad(),
                self.anomaly(angle)?,
            ]),
            OrbitType::Circular => {
                let [ex, ey, alpha] = self.circular_parameters(angle);
                Ok([self.sma_km(), ex, ey, self.inc_rad(), self.raan_rad(), alpha])
            }
            OrbitType::Equinoctial => {
                let [ex, ey, hx, hy, lon] = self.equinoctial_parameters(angle);
                Ok([self.sma_km(), ex, ey, hx, hy, lon])
            }
        }
    }
}
