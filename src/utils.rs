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

use crate::linalg::{Matrix3, Matrix6, Vector3};
use std::f64::consts::TAU;

/// Returns the tilde matrix from the provided Vector3, such that `tilde_matrix(a) * b = a x b`.
pub fn tilde_matrix(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0,
        -v[(2, 0)],
        v[(1, 0)],
        v[(2, 0)],
        0.0,
        -v[(0, 0)],
        -v[(1, 0)],
        v[(0, 0)],
        0.0,
    )
}

/// Returns the provided angle bounded between 0.0 and 360.0
pub fn between_0_360(angle: f64) -> f64 {
    let mut bounded = angle % 360.0;
    if bounded < 0.0 {
        bounded += 360.0;
    }
    bounded
}

/// Returns the provided angle in radians bounded between 0 and 2π
pub fn between_0_tau(angle_rad: f64) -> f64 {
    angle_rad.rem_euclid(TAU)
}

/// Rotation about the first axis, angle in radians (frame rotation, not vector rotation)
pub fn r1(angle_rad: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Rotation about the second axis, angle in radians (frame rotation, not vector rotation)
pub fn r2(angle_rad: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c)
}

/// Rotation about the third axis, angle in radians (frame rotation, not vector rotation)
pub fn r3(angle_rad: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Time derivative of `r3` for an angle rate in radians per second.
pub fn r3_dot(angle_rad: f64, rate_rad_s: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    rate_rad_s * Matrix3::new(-s, c, 0.0, -c, -s, 0.0, 0.0, 0.0, 0.0)
}

/// Builds the 6x6 block matrix [[top_left, 0], [bottom_left, bottom_right]].
pub fn block_lower_triangular(
    top_left: &Matrix3<f64>,
    bottom_left: &Matrix3<f64>,
    bottom_right: &Matrix3<f64>,
) -> Matrix6<f64> {
    let mut m = Matrix6::zeros();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(top_left);
    m.fixed_view_mut::<3, 3>(3, 0).copy_from(bottom_left);
    m.fixed_view_mut::<3, 3>(3, 3).copy_from(bottom_right);
    m
}

/// Returns the largest absolute difference between the two matrices, divided by the largest absolute
/// entry of the reference, or the absolute difference if the reference is zero.
pub fn mat_rel_error(candidate: &Matrix6<f64>, reference: &Matrix6<f64>) -> f64 {
    let max_diff = (candidate - reference).amax();
    let scale = reference.amax();
    if scale > 0.0 {
        max_diff / scale
    } else {
        max_diff
    }
}

#[test]
fn test_angle_bounds() {
    assert!((between_0_360(-179.0) - 181.0).abs() < f64::EPSILON);
    assert!((between_0_tau(-std::f64::consts::PI) - std::f64::consts::PI).abs() < 1e-15);
}

#[test]
fn test_rotations_are_orthonormal() {
    for angle in [0.1, 1.2, -2.5] {
        for dcm in [r1(angle), r2(angle), r3(angle)] {
            let err = (dcm * dcm.transpose() - Matrix3::identity()).norm();
            assert!(err < 1e-14, "{err:e}");
            assert!((dcm.determinant() - 1.0).abs() < 1e-14);
        }
    }
}

#[test]
fn test_r3_dot_finite_diff() {
    let (angle, rate) = (0.7, 7.292115146706979e-5);
    let dt = 1e-3;
    let fd = (r3(angle + rate * dt) - r3(angle - rate * dt)) / (2.0 * dt);
    let err = (fd - r3_dot(angle, rate)).norm();
    assert!(err < 1e-12, "{err:e}");
}

#[test]
fn test_tilde_matrix() {
    let a = Vector3::new(1.0, -2.0, 3.0);
    let b = Vector3::new(0.5, 4.0, -1.0);
    assert!((tilde_matrix(&a) * b - a.cross(&b)).norm() < f64::EPSILON);
}
