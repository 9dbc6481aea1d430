//! Cubic spline interpolation
//!
//! Interpolating cubic spline with not-a-knot end conditions: the third
//! derivative is continuous across the second and the second-to-last knots, so
//! the first two and last two pieces are each a single cubic. With exactly four
//! knots this is the unique cubic through all points.

use crate::config::MIN_BUCKET_COUNT;
use crate::error::AnalysisError;

/// Piecewise cubic interpolant stored as knot values and second derivatives
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    /// Fit a not-a-knot cubic spline through `(x[i], y[i])`.
    ///
    /// Requires at least four points, finite values and strictly increasing `x`.
    pub fn not_a_knot(x: &[f64], y: &[f64]) -> Result<Self, AnalysisError> {
        let n = x.len();
        if n != y.len() {
            return Err(AnalysisError::MalformedInput(format!(
                "spline knots and values differ in length ({} vs {})",
                n,
                y.len()
            )));
        }
        if n < MIN_BUCKET_COUNT {
            return Err(AnalysisError::InsufficientStepsForAveraging(format!(
                "cubic interpolation needs at least {} points, got {}",
                MIN_BUCKET_COUNT, n
            )));
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(AnalysisError::InsufficientStepsForAveraging(
                "spline input contains non-finite values".to_string(),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AnalysisError::InsufficientStepsForAveraging(
                "spline knots must be strictly increasing".to_string(),
            ));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let slopes: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

        // Interior rows i = 1..n-2 for unknowns M_1..M_{n-2}, with M_0 and
        // M_{n-1} eliminated through the not-a-knot conditions.
        let m = n - 2;
        let mut lower = vec![0.0; m];
        let mut diag = vec![0.0; m];
        let mut upper = vec![0.0; m];
        let mut rhs = vec![0.0; m];

        for row in 0..m {
            let i = row + 1;
            lower[row] = h[i - 1];
            diag[row] = 2.0 * (h[i - 1] + h[i]);
            upper[row] = h[i];
            rhs[row] = 6.0 * (slopes[i] - slopes[i - 1]);
        }

        // M_0 = (1 + h0/h1) M_1 - (h0/h1) M_2
        let (h0, h1) = (h[0], h[1]);
        diag[0] += h0 * (1.0 + h0 / h1);
        upper[0] -= h0 * h0 / h1;
        lower[0] = 0.0;

        // M_{n-1} = (1 + hb/ha) M_{n-2} - (hb/ha) M_{n-3}
        let (ha, hb) = (h[n - 3], h[n - 2]);
        diag[m - 1] += hb * (1.0 + hb / ha);
        lower[m - 1] -= hb * hb / ha;
        upper[m - 1] = 0.0;

        let interior = solve_tridiagonal(&lower, &diag, &upper, &rhs)?;

        let mut second_derivatives = Vec::with_capacity(n);
        let first = (1.0 + h0 / h1) * interior[0] - (h0 / h1) * interior[1];
        second_derivatives.push(first);
        second_derivatives.extend_from_slice(&interior);
        let last = (1.0 + hb / ha) * interior[m - 1] - (hb / ha) * interior[m - 2];
        second_derivatives.push(last);

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            second_derivatives,
        })
    }

    /// Evaluate the spline at `at`; outside the knots the end pieces are extended
    pub fn evaluate(&self, at: f64) -> f64 {
        let n = self.x.len();
        let upper = self.x.partition_point(|&knot| knot <= at);
        let i = upper.saturating_sub(1).min(n - 2);

        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (y0, y1) = (self.y[i], self.y[i + 1]);
        let (m0, m1) = (self.second_derivatives[i], self.second_derivatives[i + 1]);
        let h = x1 - x0;
        let a = x1 - at;
        let b = at - x0;

        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }

    /// Evaluate at every point of `grid`
    pub fn evaluate_all(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&t| self.evaluate(t)).collect()
    }
}

/// `count` evenly spaced values from `start` to `end`, both included
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Thomas algorithm for a tridiagonal system
fn solve_tridiagonal(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[f64],
) -> Result<Vec<f64>, AnalysisError> {
    let n = diag.len();
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    let mut pivot = diag[0];
    for i in 0..n {
        if i > 0 {
            pivot = diag[i] - lower[i] * c_prime[i - 1];
        }
        if pivot.abs() < f64::EPSILON {
            return Err(AnalysisError::InsufficientStepsForAveraging(
                "singular spline system".to_string(),
            ));
        }
        c_prime[i] = upper[i] / pivot;
        let carried = if i > 0 { lower[i] * d_prime[i - 1] } else { 0.0 };
        d_prime[i] = (rhs[i] - carried) / pivot;
    }

    let mut solution = vec![0.0; n];
    solution[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        solution[i] = d_prime[i] - c_prime[i] * solution[i + 1];
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_passes_through_knots() {
        let x = [0.0, 0.5, 1.2, 2.0, 2.5, 3.1];
        let y = [1.0, -2.0, 0.5, 4.0, 3.0, -1.0];
        let spline = CubicSpline::not_a_knot(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!(close(spline.evaluate(*xi), *yi, 1e-9), "{} != {}", spline.evaluate(*xi), yi);
        }
    }

    #[test]
    fn test_reproduces_cubic_exactly() {
        let f = |t: f64| 2.0 * t.powi(3) - t * t + 0.5 * t - 3.0;
        let x: Vec<f64> = vec![0.0, 0.3, 1.0, 1.4, 2.2, 3.0, 3.5];
        let y: Vec<f64> = x.iter().map(|&t| f(t)).collect();
        let spline = CubicSpline::not_a_knot(&x, &y).unwrap();
        for t in linspace(0.0, 3.5, 41) {
            assert!(close(spline.evaluate(t), f(t), 1e-8), "at {}: {} vs {}", t, spline.evaluate(t), f(t));
        }
    }

    #[test]
    fn test_four_points_give_single_cubic() {
        let f = |t: f64| t.powi(3) - 4.0 * t;
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|&t| f(t)).collect();
        let spline = CubicSpline::not_a_knot(&x, &y).unwrap();
        assert!(close(spline.evaluate(1.5), f(1.5), 1e-9));
        assert!(close(spline.evaluate(2.75), f(2.75), 1e-9));
    }

    #[test]
    fn test_too_few_points_rejected() {
        let result = CubicSpline::not_a_knot(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]);
        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientStepsForAveraging(_))
        ));
    }

    #[test]
    fn test_nan_values_rejected() {
        let result = CubicSpline::not_a_knot(&[0.0, 1.0, 2.0, 3.0], &[0.0, f64::NAN, 0.0, 1.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_linspace_endpoints() {
        let grid = linspace(0.0, 0.95, 500);
        assert_eq!(grid.len(), 500);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[499], 0.95);
        assert!(grid.windows(2).all(|w| w[1] > w[0]));
        assert!(linspace(1.0, 2.0, 0).is_empty());
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
    }
}
