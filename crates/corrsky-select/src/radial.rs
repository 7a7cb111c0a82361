//! Radial selection curves.
//!
//! A tabulated curve is interpolated with a natural cubic spline (zero
//! second derivative at both ends). Interpolated values below zero are
//! read as zero density.

use std::fs;
use std::path::Path;

use corrsky_core::{warning, ZRange};

use crate::error::SplineError;

/// Natural cubic spline through tabulated points.
#[derive(Clone, Debug, PartialEq)]
pub struct Spline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots.
    y2: Vec<f64>,
}

impl Spline {
    /// Fit a spline through `(x[i], y[i])`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the arrays differ in length, hold fewer than two
    /// points, or `x` is not strictly increasing.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        let n = x.len();
        if n < 2 {
            return Err(SplineError::TooFewPoints { count: n });
        }
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(SplineError::NotIncreasing { index: i });
        }
        if let Some(i) = (1..n).find(|&i| x[i] <= x[i - 1]) {
            return Err(SplineError::NotIncreasing { index: i });
        }

        // Tridiagonal sweep for the second derivatives.
        let mut y2 = vec![0.0; n];
        let mut u = vec![0.0; n];
        for i in 1..n - 1 {
            let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
            let p = sig * y2[i - 1] + 2.0;
            y2[i] = (sig - 1.0) / p;
            let d = (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
            u[i] = (6.0 * d / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
        }
        y2[n - 1] = 0.0;
        for k in (0..n - 1).rev() {
            y2[k] = y2[k] * y2[k + 1] + u[k];
        }
        Ok(Self { x, y, y2 })
    }

    /// Interpolated value at `x`. Outside the table the end cubic is
    /// extended.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();
        // Bisection for the bracketing interval.
        let mut lo = 0;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (hi + lo) / 2;
            if self.x[mid] > x {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        let h = self.x[hi] - self.x[lo];
        let a = (self.x[hi] - x) / h;
        let b = (x - self.x[lo]) / h;
        a * self.y[lo]
            + b * self.y[hi]
            + ((a * a * a - a) * self.y2[lo] + (b * b * b - b) * self.y2[hi]) * (h * h) / 6.0
    }

    /// Tabulated abscissas.
    pub fn knots(&self) -> &[f64] {
        &self.x
    }
}

/// Redshift dependence of a selection function.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RadialCurve {
    /// Weight 1 at every redshift.
    #[default]
    Flat,
    /// Spline through a tabulated curve.
    Tabulated(Spline),
}

/// Panels used by [`RadialCurve::integral_over`].
const SIMPSON_PANELS: usize = 512;

impl RadialCurve {
    /// Spline through `(z, weight)` points.
    pub fn tabulated(z: Vec<f64>, weight: Vec<f64>) -> Result<Self, SplineError> {
        Spline::new(z, weight).map(Self::Tabulated)
    }

    /// Read a two-column `z weight` text table.
    ///
    /// A missing or malformed table falls back to [`RadialCurve::Flat`]
    /// and records a warning.
    pub fn load(path: &Path) -> Self {
        match read_table(path) {
            Ok(curve) => {
                tracing::debug!(path = %path.display(), "radial selection loaded");
                curve
            }
            Err(reason) => {
                warning::warn(format_args!(
                    "could not load radial selection from {}: {reason}; using weight 1",
                    path.display()
                ));
                Self::Flat
            }
        }
    }

    /// Returns `true` for the flat curve.
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }

    /// Selection density at `z`, never negative.
    pub fn density(&self, z: f64) -> f64 {
        match self {
            Self::Flat => 1.0,
            Self::Tabulated(s) => s.eval(z).max(0.0),
        }
    }

    /// Integrated density over `range`, `∫ density dz` by Simpson's rule.
    /// The flat curve contributes 1.
    pub fn integral_over(&self, range: ZRange) -> f64 {
        match self {
            Self::Flat => 1.0,
            Self::Tabulated(_) => {
                let h = range.width() / SIMPSON_PANELS as f64;
                let mut sum = self.density(range.min) + self.density(range.max);
                for i in 1..SIMPSON_PANELS {
                    let w = if i % 2 == 1 { 4.0 } else { 2.0 };
                    sum += w * self.density(range.min + h * i as f64);
                }
                sum * h / 3.0
            }
        }
    }
}

fn read_table(path: &Path) -> Result<RadialCurve, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let mut z = Vec::new();
    let mut w = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut cols = line.split_whitespace().map(str::parse::<f64>);
        match (cols.next(), cols.next()) {
            (Some(Ok(a)), Some(Ok(b))) => {
                z.push(a);
                w.push(b);
            }
            _ => return Err(format!("line {}: expected two numbers", lineno + 1)),
        }
    }
    RadialCurve::tabulated(z, w).map_err(|e| e.to_string())
}
