//! Angular power spectrum <-> angular correlation function.
//!
//! The correlation function is sampled at the `n` Gauss-Chebyshev nodes
//! `μ_k = cos(π (2k+1) / 2n)`. The forward direction rewrites the Legendre
//! series `ξ(μ) = Σ_l (2l+1)/(4π) C_l P_l(μ)` as a Chebyshev series with a
//! ratio recursion and sums it with a DCT-III; the inverse direction
//! applies a DCT-II and the reciprocal recursion.
//!
//! Both recursions are carried across rows without restarting, so their
//! cost is `O(n²)` multiplications with no special-function evaluation.

use std::f64::consts::PI;

use corrsky_core::ConfigError;

use crate::dct::DctPlan;

/// Transform between spectra and correlation functions of a fixed length.
///
/// Holds the DCT plan so repeated transforms of the same length reuse it.
#[derive(Debug)]
pub struct SpectrumTransform {
    plan: DctPlan,
}

impl SpectrumTransform {
    /// Plan transforms on `n` samples.
    pub fn new(n: usize) -> Self {
        Self {
            plan: DctPlan::new(n),
        }
    }

    /// Number of samples per transform.
    pub fn len(&self) -> usize {
        self.plan.len()
    }

    /// Returns `true` for a zero-length transform.
    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }

    /// Correlation function at the Chebyshev nodes from `C_l`, `l = 0..n`.
    pub fn to_correlation(&self, cl: &[f64]) -> Result<Vec<f64>, ConfigError> {
        let n = self.check_len(cl)?;
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut coeffs = vec![0.0; n];

        // Row 0 only couples even multipoles.
        let mut a = 1.0 / (4.0 * PI);
        let mut b = a;
        coeffs[0] = b * cl[0];
        for l in (2..n).step_by(2) {
            let lf = l as f64;
            b *= ((lf - 1.0) * (lf - 1.0)) / (lf * lf);
            coeffs[0] += b * (2.0 * lf + 1.0) * cl[l];
        }

        for k in 1..n {
            let kf = k as f64;
            a *= 1.0 - 0.5 / kf;
            b = a;
            coeffs[k] = b * (2.0 * kf + 1.0) * cl[k];
            for l in (k + 2..n).step_by(2) {
                let lf = l as f64;
                b *= ((lf - kf - 1.0) * (lf + kf - 1.0)) / ((lf - kf) * (lf + kf));
                coeffs[k] += b * (2.0 * lf + 1.0) * cl[l];
            }
        }

        self.plan.dct3(&coeffs, 1.0)
    }

    /// `C_l`, `l = 0..n`, from the correlation function at the Chebyshev nodes.
    pub fn to_spectrum(&self, xi: &[f64]) -> Result<Vec<f64>, ConfigError> {
        let n = self.check_len(xi)?;
        if n == 0 {
            return Ok(Vec::new());
        }

        // Rows are processed in increasing order, so `cl[k]` for `k > l`
        // still holds the DCT coefficient when row `l` reads it.
        let mut cl = self.plan.dct2(xi, 1.0 / n as f64)?;

        let mut a = 2.0 * PI;
        let mut b = a;
        cl[0] *= b;
        for k in (2..n).step_by(2) {
            let kf = k as f64;
            b *= (kf - 3.0) / (kf + 1.0);
            cl[0] += 2.0 * b * cl[k];
        }

        for l in 1..n {
            let lf = l as f64;
            a *= 1.0 - 1.0 / (2.0 * lf + 1.0);
            b = a;
            cl[l] *= b;
            for k in (l + 2..n).step_by(2) {
                let kf = k as f64;
                b *= (kf * (kf + lf - 2.0) * (kf - lf - 3.0))
                    / ((kf - 2.0) * (kf + lf + 1.0) * (kf - lf));
                cl[l] += b * cl[k];
            }
        }

        Ok(cl)
    }

    fn check_len(&self, input: &[f64]) -> Result<usize, ConfigError> {
        if input.len() != self.plan.len() {
            return Err(ConfigError::LengthMismatch {
                what: "spectrum transform input",
                expected: self.plan.len(),
                actual: input.len(),
            });
        }
        Ok(input.len())
    }
}

/// One-shot forward transform: `C_l` to `ξ` on `cl.len()` nodes.
pub fn spectrum_to_correlation(cl: &[f64]) -> Vec<f64> {
    SpectrumTransform::new(cl.len())
        .to_correlation(cl)
        .unwrap_or_default()
}

/// One-shot inverse transform: `ξ` on `xi.len()` nodes to `C_l`.
pub fn correlation_to_spectrum(xi: &[f64]) -> Vec<f64> {
    SpectrumTransform::new(xi.len())
        .to_spectrum(xi)
        .unwrap_or_default()
}

/// The `n` nodes `μ_k = cos(π (2k+1) / 2n)` at which correlation
/// functions are sampled, in decreasing order.
pub fn correlation_nodes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|k| (PI * (2 * k + 1) as f64 / (2 * n) as f64).cos())
        .collect()
}
