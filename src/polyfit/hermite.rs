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

use super::{
    InterpolationError, MismatchedLengthsSnafu, NoInterpolationDataSnafu,
    NonDistinctAbscissasSnafu,
};
use snafu::ensure;

/// Evaluates the Hermite interpolant, and its first derivative, of the samples at `x`.
///
/// `orders[0]` holds the values at each node of `xs`, `orders[1]` the first derivatives,
/// `orders[2]` the second derivatives, and so on. Every order must provide one value per node.
/// With a single order this is a Lagrange interpolation.
///
/// The interpolant is built in Newton form from the generalized divided differences, where
/// repeated nodes use the provided derivatives, and evaluated with a Horner scheme which carries the derivative.
pub fn hermite_eval_orders(
    xs: &[f64],
    orders: &[&[f64]],
    x: f64,
) -> Result<(f64, f64), InterpolationError> {
    ensure!(!xs.is_empty(), NoInterpolationDataSnafu { what: "X" });
    ensure!(!orders.is_empty(), NoInterpolationDataSnafu { what: "Y" });
    for values in orders {
        ensure!(
            values.len() == xs.len(),
            MismatchedLengthsSnafu {
                what: "X and Y",
                expected: xs.len(),
                got: values.len()
            }
        );
    }
    for (i, xi) in xs.iter().enumerate() {
        if let Some(dup) = xs.iter().skip(i + 1).find(|xj| *xj == xi) {
            return NonDistinctAbscissasSnafu { x: *dup }.fail();
        }
    }

    let mult = orders.len();
    let n = mult * xs.len();
    // Node of each row of the divided difference table
    let zs: Vec<f64> = (0..n).map(|i| xs[i / mult]).collect();

    // Divided difference table, column by column (only the previous column is needed).
    let mut column: Vec<f64> = (0..n).map(|i| orders[0][i / mult]).collect();
    let mut coeffs = Vec::with_capacity(n);
    coeffs.push(column[0]);
    let mut factorial = 1.0;
    for j in 1..n {
        factorial *= j as f64;
        let mut next = vec![0.0; n];
        for i in j..n {
            next[i] = if i / mult == (i - j) / mult {
                // Same node repeated j+1 times: the divided difference is the j-th derivative over j!
                orders[j][i / mult] / factorial
            } else {
                (column[i] - column[i - 1]) / (zs[i] - zs[i - j])
            };
        }
        coeffs.push(next[j]);
        column = next;
    }

    let mut value = coeffs[n - 1];
    let mut deriv = 0.0;
    for i in (0..n - 1).rev() {
        deriv = deriv * (x - zs[i]) + value;
        value = value * (x - zs[i]) + coeffs[i];
    }

    if !value.is_finite() || !deriv.is_finite() {
        return Err(InterpolationError::InvalidInterpolation {
            msg: format!("non finite interpolation at {x}: value = {value}, derivative = {deriv}"),
        });
    }

    Ok((value, deriv))
}

/// Evaluates the Hermite interpolant of the values and first derivatives at `x`, returning the value and the derivative.
///
/// ```
/// use nyx_covariance::polyfit::hermite_eval;
///
/// let xs: Vec<_> = (0..8).map(|i| i as f64).collect();
/// let ys: Vec<_> = xs.iter().map(|x| x.cos()).collect();
/// let derivs: Vec<_> = xs.iter().map(|x| -x.sin()).collect();
///
/// let (eval, deriv) = hermite_eval(&xs, &ys, &derivs, 2.5).unwrap();
/// assert!((eval - 2.5_f64.cos()).abs() < 1e-9);
/// assert!((deriv + 2.5_f64.sin()).abs() < 1e-7);
/// ```
pub fn hermite_eval(
    xs: &[f64],
    ys: &[f64],
    derivs: &[f64],
    x: f64,
) -> Result<(f64, f64), InterpolationError> {
    hermite_eval_orders(xs, &[ys, derivs], x)
}

#[test]
fn hermite_sine_test() {
    let xs: Vec<_> = (0..8).map(|i| i as f64).collect();
    let ys: Vec<_> = xs.iter().map(|x| x.cos()).collect();
    let derivs: Vec<_> = xs.iter().map(|x| -x.sin()).collect();

    let tol = 1e-10;

    let mut max_eval_err: f64 = 0.0;
    let mut max_deriv_err: f64 = 0.0;

    for x in &xs {
        let (eval, deriv) = hermite_eval(&xs, &ys, &derivs, *x).unwrap();
        let eval_err = (eval - x.cos()).abs();
        assert!(eval_err < tol, "{x}: {eval_err:e}");
        max_eval_err = max_eval_err.max(eval_err);

        let deriv_err = (deriv - -x.sin()).abs();
        assert!(deriv_err < tol, "{x}: {deriv_err:e}");
        max_deriv_err = max_deriv_err.max(deriv_err);
    }

    // Between the nodes, the error is bounded by the 16th derivative of the cosine
    for x in [2.5, 3.25, 3.5, 4.5] {
        let (eval, deriv) = hermite_eval(&xs, &ys, &derivs, x).unwrap();
        assert!((eval - x.cos()).abs() < 1e-8, "{x}");
        assert!((deriv - -x.sin()).abs() < 1e-7, "{x}");
    }

    println!("Max eval error: {max_eval_err:.e}\tMax deriv error: {max_deriv_err:.e}\t");
}

#[test]
fn hermite_constant_test() {
    let xs: Vec<_> = (0..8).map(|i| i as f64).collect();
    let ys: Vec<_> = xs.iter().map(|_| 2.0159).collect();
    let derivs: Vec<_> = xs.iter().map(|_| 0.0).collect();

    for x in [0.0, 0.5, 3.3, 7.0] {
        let (eval, deriv) = hermite_eval(&xs, &ys, &derivs, x).unwrap();
        assert!((eval - 2.0159).abs() < 1e-12);
        assert!(deriv.abs() < 1e-12);
    }
}

#[test]
fn hermite_second_order_test() {
    // A quintic is reproduced exactly from two nodes with value, first and second derivatives
    let f = |x: f64| 3.0 * x.powi(5) - x.powi(3) + 2.0;
    let df = |x: f64| 15.0 * x.powi(4) - 3.0 * x.powi(2);
    let d2f = |x: f64| 60.0 * x.powi(3) - 6.0 * x;
    let xs = [-1.0, 2.0];
    let ys: Vec<_> = xs.iter().map(|x| f(*x)).collect();
    let dys: Vec<_> = xs.iter().map(|x| df(*x)).collect();
    let d2ys: Vec<_> = xs.iter().map(|x| d2f(*x)).collect();
    for x in [-1.0, -0.3, 0.0, 1.1, 2.0] {
        let (eval, deriv) = hermite_eval_orders(&xs, &[ys.as_slice(), dys.as_slice(), d2ys.as_slice()], x).unwrap();
        assert!((eval - f(x)).abs() < 1e-10, "{x}");
        assert!((deriv - df(x)).abs() < 1e-9, "{x}");
    }
}

#[test]
fn hermite_ephem_spline_test() {
    let ts = [
        -1.0,
        -0.7142321608948587,
        -0.4284548929983568,
        -0.14272281352821248,
        0.1430009063036013,
        0.4286973024022658,
        0.714367019041751,
        1.0,
    ];
    let values = [
        -1200.6957374089038,
        -1649.3350718512218,
        -2088.1291193578113,
        -2514.3714789070427,
        -2925.5702772667646,
        -3319.240151300038,
        -3693.030156393982,
        -4044.695271513933,
    ];
    let values_dt = [
        -5.450221271198159,
        -5.3475633589540585,
        -5.212915678573803,
        -5.0471031201910135,
        -4.851091887968967,
        -4.626059429784994,
        -4.373345524123602,
        -4.094465775216765,
    ];

    let tol = 2e-7;

    for (i, t) in ts.iter().enumerate() {
        let (eval, _) = hermite_eval(&ts, &values, &values_dt, *t).unwrap();
        let eval_err = (eval - values[i]).abs();
        assert!(dbg!(eval_err) < tol);
    }
}

#[test]
fn hermite_invalid_inputs() {
    assert_eq!(
        hermite_eval(&[], &[], &[], 0.0),
        Err(InterpolationError::NoInterpolationData { what: "X" })
    );
    assert!(matches!(
        hermite_eval(&[0.0, 1.0], &[1.0], &[0.0, 0.0], 0.5),
        Err(InterpolationError::MismatchedLengths { .. })
    ));
    assert_eq!(
        hermite_eval(&[0.0, 1.0, 1.0], &[1.0; 3], &[0.0; 3], 0.5),
        Err(InterpolationError::NonDistinctAbscissas { x: 1.0 })
    );
}
