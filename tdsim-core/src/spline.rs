//! Weighted cubic smoothing spline and the regular-grid reconstructor.
//!
//! The spline minimises
//!
//! ```text
//! sum_i (w_i (y_i - g(x_i)))^2 + lambda * integral g''(x)^2 dx
//! ```
//!
//! via the Reinsch algorithm (Green & Silverman 1994, ch. 2). With
//! `lambda == 0` it is the natural interpolating cubic spline and the
//! weights drop out. The banded system is pentadiagonal and solved in O(n).
//!
//! The reconstruction knows nothing about gaps in the data: across a season
//! gap it interpolates a smooth but physically meaningless curve.

use crate::error::{ensure_len, LightCurveError, Result};
use crate::signal::Signal;

/// A fitted natural cubic spline: knot values and second derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    /// Second derivatives at the knots; zero at both ends.
    curvature: Vec<f64>,
}

impl SmoothingSpline {
    /// Interpolating spline through `(x, y)`.
    pub fn interpolate(x: &[f64], y: &[f64]) -> Result<Self> {
        Self::fit(x, y, None, 0.0)
    }

    /// Fit a spline with per-point reliability `weights` and penalty `smoothing`.
    ///
    /// Weights multiply residuals; only their magnitude matters. They are
    /// ignored when `smoothing == 0`, otherwise every weight must be
    /// non-zero.
    pub fn fit(x: &[f64], y: &[f64], weights: Option<&[f64]>, smoothing: f64) -> Result<Self> {
        ensure_len("spline y", x.len(), y.len())?;
        if let Some(w) = weights {
            ensure_len("spline weights", x.len(), w.len())?;
        }
        if x.len() < 2 {
            return Err(LightCurveError::invalid(format!(
                "a spline needs at least two points, got {}",
                x.len()
            )));
        }
        if !(smoothing.is_finite() && smoothing >= 0.0) {
            return Err(LightCurveError::invalid(format!(
                "smoothing factor must be non-negative, got {smoothing}"
            )));
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(LightCurveError::invalid("spline data must be finite"));
        }
        let h: Vec<f64> = x.windows(2).map(|p| p[1] - p[0]).collect();
        if h.iter().any(|&d| d <= 0.0) {
            return Err(LightCurveError::invalid(
                "spline abscissae must be strictly increasing",
            ));
        }

        // Inverse residual variance per point, 1 / w_i^2.
        let inv_w2: Vec<f64> = match (weights, smoothing > 0.0) {
            (Some(w), true) => {
                if w.iter().any(|&v| !v.is_finite() || v == 0.0) {
                    return Err(LightCurveError::invalid(
                        "smoothing weights must be finite and non-zero",
                    ));
                }
                w.iter().map(|v| 1.0 / (v * v)).collect()
            }
            _ => vec![1.0; x.len()],
        };

        let n = x.len();
        let m = n - 2;
        if m == 0 {
            return Ok(Self {
                knots: x.to_vec(),
                values: y.to_vec(),
                curvature: vec![0.0; n],
            });
        }

        // Column c of Q (n x m) belongs to interior knot c + 1 and is
        // non-zero on rows c, c + 1, c + 2.
        let q = |row: usize, col: usize| -> f64 {
            match row as isize - col as isize {
                0 => 1.0 / h[col],
                1 => -1.0 / h[col] - 1.0 / h[col + 1],
                2 => 1.0 / h[col + 1],
                _ => 0.0,
            }
        };

        // band[c] = [A(c,c), A(c,c-1), A(c,c-2)] of A = R + lambda Q' W^-1 Q.
        let mut band = vec![[0.0f64; 3]; m];
        for c in 0..m {
            band[c][0] = (h[c] + h[c + 1]) / 3.0;
            if c >= 1 {
                band[c][1] = h[c] / 6.0;
            }
        }
        if smoothing > 0.0 {
            for c in 0..m {
                for d in 0..=2usize.min(c) {
                    let other = c - d;
                    // Rows shared by columns c and c - d: c .. other + 2.
                    let mut acc = 0.0;
                    for row in c..=other + 2 {
                        acc += q(row, c) * q(row, other) * inv_w2[row];
                    }
                    band[c][d] += smoothing * acc;
                }
            }
        }

        let rhs: Vec<f64> = (0..m)
            .map(|c| (y[c + 2] - y[c + 1]) / h[c + 1] - (y[c + 1] - y[c]) / h[c])
            .collect();
        let gamma = solve_banded(&band, &rhs)?;

        let values: Vec<f64> = if smoothing > 0.0 {
            (0..n)
                .map(|row| {
                    let lo = row.saturating_sub(2);
                    let hi = row.min(m - 1);
                    let qg: f64 = (lo..=hi).map(|c| q(row, c) * gamma[c]).sum();
                    y[row] - smoothing * inv_w2[row] * qg
                })
                .collect()
        } else {
            y.to_vec()
        };

        let mut curvature = Vec::with_capacity(n);
        curvature.push(0.0);
        curvature.extend_from_slice(&gamma);
        curvature.push(0.0);

        Ok(Self {
            knots: x.to_vec(),
            values,
            curvature,
        })
    }

    /// Fitted values at the knots.
    pub fn knot_values(&self) -> &[f64] {
        &self.values
    }

    /// Evaluate at `x`; outside the knots the spline continues linearly.
    pub fn evaluate(&self, x: f64) -> f64 {
        let t = &self.knots;
        let g = &self.values;
        let gamma = &self.curvature;
        let n = t.len();

        if x <= t[0] {
            let h = t[1] - t[0];
            let slope = (g[1] - g[0]) / h - h * gamma[1] / 6.0;
            return g[0] - (t[0] - x) * slope;
        }
        if x >= t[n - 1] {
            let h = t[n - 1] - t[n - 2];
            let slope = (g[n - 1] - g[n - 2]) / h + h * gamma[n - 2] / 6.0;
            return g[n - 1] + (x - t[n - 1]) * slope;
        }

        // Interval i with t[i] <= x < t[i + 1].
        let i = t.partition_point(|&k| k <= x) - 1;
        let h = t[i + 1] - t[i];
        let a = x - t[i];
        let b = t[i + 1] - x;
        (a * g[i + 1] + b * g[i]) / h
            - a * b / 6.0 * ((1.0 + a / h) * gamma[i + 1] + (1.0 + b / h) * gamma[i])
    }
}

/// LDL' solve of a symmetric pentadiagonal system.
///
/// `band[i] = [A(i,i), A(i,i-1), A(i,i-2)]`.
fn solve_banded(band: &[[f64; 3]], rhs: &[f64]) -> Result<Vec<f64>> {
    let m = band.len();
    // l[i] = [L(i,i-1), L(i,i-2)]
    let mut l = vec![[0.0f64; 2]; m];
    let mut d = vec![0.0f64; m];

    for i in 0..m {
        if i >= 2 {
            l[i][1] = band[i][2] / d[i - 2];
        }
        if i >= 1 {
            let mut v = band[i][1];
            if i >= 2 {
                v -= l[i][1] * d[i - 2] * l[i - 1][0];
            }
            l[i][0] = v / d[i - 1];
        }
        let mut diag = band[i][0];
        if i >= 1 {
            diag -= l[i][0] * l[i][0] * d[i - 1];
        }
        if i >= 2 {
            diag -= l[i][1] * l[i][1] * d[i - 2];
        }
        if !(diag.is_finite() && diag > 0.0) {
            return Err(LightCurveError::invalid(
                "spline system is not positive definite",
            ));
        }
        d[i] = diag;
    }

    let mut z = rhs.to_vec();
    for i in 0..m {
        if i >= 1 {
            z[i] -= l[i][0] * z[i - 1];
        }
        if i >= 2 {
            z[i] -= l[i][1] * z[i - 2];
        }
    }
    for i in 0..m {
        z[i] /= d[i];
    }
    for i in (0..m).rev() {
        if i + 1 < m {
            z[i] -= l[i + 1][0] * z[i + 1];
        }
        if i + 2 < m {
            z[i] -= l[i + 2][1] * z[i + 2];
        }
    }
    Ok(z)
}

/// Options for [`reconstruct`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReconstructOptions {
    /// Output range; defaults to the data's min/max.
    pub range: Option<(f64, f64)>,
    /// Output point count; defaults to the input length.
    pub points: Option<usize>,
    /// Smoothing penalty; 0 interpolates.
    pub smoothing: f64,
}

/// `points` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points)
                .map(|i| {
                    if i == points - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Fit `(x, y)` with `weights` and evaluate on a regular grid.
pub fn reconstruct(
    x: &[f64],
    y: &[f64],
    weights: &[f64],
    options: &ReconstructOptions,
) -> Result<Signal> {
    let spline = SmoothingSpline::fit(x, y, Some(weights), options.smoothing)?;

    let (start, end) = match options.range {
        Some(range) => range,
        None => {
            let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (lo, hi)
        }
    };
    if !(start.is_finite() && end.is_finite() && start <= end) {
        return Err(LightCurveError::invalid(format!(
            "invalid reconstruction range [{start}, {end}]"
        )));
    }
    let points = options.points.unwrap_or(x.len());
    if points == 0 {
        return Err(LightCurveError::invalid("reconstruction needs at least one point"));
    }

    let grid = linspace(start, end, points);
    let fit = grid.iter().map(|&t| spline.evaluate(t)).collect();
    Signal::new(grid, fit)
}
