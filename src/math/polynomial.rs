//! Single-variable polynomials for the iso-parametric to local mapping

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

const ROOT_TOLERANCE: f64 = 1e-12;
const MAX_ROOT_ITERATIONS: usize = 100;

/// Polynomial with coefficients in ascending order: `c0 + c1*x + c2*x^2 + ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    pub coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Fit the polynomial of degree `n - 1` through `n` points by inverting
    /// the Vandermonde matrix.
    ///
    /// Returns the polynomial and the largest residual at the fit points.
    pub fn fit(xs: &[f64], ys: &[f64]) -> FEAResult<(Self, f64)> {
        let n = xs.len();
        if n == 0 || n != ys.len() {
            return Err(FEAError::MathError(format!(
                "cannot fit a polynomial through {} abscissae and {} ordinates",
                n,
                ys.len()
            )));
        }

        let vandermonde = DMatrix::from_fn(n, n, |i, j| xs[i].powi(j as i32));
        let inverse = vandermonde.try_inverse().ok_or_else(|| {
            FEAError::MathError("Vandermonde matrix is singular (repeated abscissae)".into())
        })?;
        let coefficients = inverse * DVector::from_column_slice(ys);

        let poly = Self::new(coefficients.iter().copied().collect());
        let residual = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| (poly.evaluate(*x) - y).abs())
            .fold(0.0, f64::max);

        Ok((poly, residual))
    }

    /// Evaluate with Horner's scheme
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    pub fn derivative(&self) -> Polynomial {
        Polynomial::new(
            self.coefficients
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| c * i as f64)
                .collect(),
        )
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Find `x` in `[lo, hi]` with `p(x) = target`.
    ///
    /// Newton steps are kept inside a shrinking bracket and replaced by
    /// bisection whenever they leave it. Returns `None` when the bracket does
    /// not contain a sign change.
    pub fn try_find_root(&self, target: f64, lo: f64, hi: f64) -> Option<f64> {
        let f = |x: f64| self.evaluate(x) - target;
        let df = self.derivative();

        let (mut a, mut b) = (lo, hi);
        let (fa, fb) = (f(a), f(b));
        if fa.abs() <= ROOT_TOLERANCE {
            return Some(a);
        }
        if fb.abs() <= ROOT_TOLERANCE {
            return Some(b);
        }
        if fa.signum() == fb.signum() {
            return None;
        }
        let rising = fb > fa;

        let mut x = 0.5 * (a + b);
        for _ in 0..MAX_ROOT_ITERATIONS {
            let fx = f(x);
            if fx.abs() <= ROOT_TOLERANCE * (1.0 + target.abs()) {
                return Some(x);
            }

            if (fx > 0.0) == rising {
                b = x;
            } else {
                a = x;
            }

            let slope = df.evaluate(x);
            let newton = if slope != 0.0 { x - fx / slope } else { f64::NAN };
            x = if newton > a && newton < b {
                newton
            } else {
                0.5 * (a + b)
            };

            if (b - a).abs() <= f64::EPSILON * (1.0 + x.abs()) {
                return Some(x);
            }
        }

        Some(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_fit_through_two_points() {
        let (p, residual) = Polynomial::fit(&[-1.0, 1.0], &[0.0, 5.0]).unwrap();
        assert!(residual < 1e-12);
        assert_relative_eq!(p.coefficients[0], 2.5, epsilon = 1e-12);
        assert_relative_eq!(p.coefficients[1], 2.5, epsilon = 1e-12);
        assert_eq!(p.degree(), 1);
    }

    #[test]
    fn test_quadratic_fit_and_derivative() {
        // y = 1 + 2x + 3x^2
        let xs = [-1.0, 0.0, 1.0];
        let ys: Vec<f64> = xs.iter().map(|x| 1.0 + 2.0 * x + 3.0 * x * x).collect();
        let (p, _) = Polynomial::fit(&xs, &ys).unwrap();

        assert_relative_eq!(p.evaluate(0.5), 1.0 + 1.0 + 0.75, epsilon = 1e-12);
        assert_relative_eq!(p.derivative().evaluate(0.5), 2.0 + 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_root_inside_bracket() {
        let p = Polynomial::new(vec![2.5, 2.5]);
        let xi = p.try_find_root(1.25, -1.0, 1.0).unwrap();
        assert_relative_eq!(xi, -0.5, epsilon = 1e-10);

        assert!(p.try_find_root(10.0, -1.0, 1.0).is_none());
    }

    #[test]
    fn test_repeated_abscissae_rejected() {
        assert!(Polynomial::fit(&[0.0, 0.0], &[1.0, 2.0]).is_err());
    }
}
