//! Lower-triangular Cholesky factors of per-multipole covariance matrices.

use rustfft::num_complex::Complex64;

use crate::error::CholeskyError;

/// Lower-triangular `N×N` factor `L` with `L·Lᵀ = C`.
///
/// Stored row-major as a dense `N×N` array; entries above the diagonal
/// are zero.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor {
    n: usize,
    lower: Vec<f64>,
}

impl CholeskyFactor {
    /// Factor a symmetric positive-definite matrix (row-major, `n×n`).
    ///
    /// Cholesky-Banachiewicz: row by row, reading only the lower triangle
    /// of `cov`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `cov` is not `n×n` or a pivot is not strictly
    /// positive (including NaN).
    pub fn decompose(cov: &[f64], n: usize) -> Result<Self, CholeskyError> {
        if cov.len() != n * n {
            return Err(CholeskyError::LengthMismatch {
                expected: n * n,
                actual: cov.len(),
            });
        }

        let mut lower = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..=i {
                let dot: f64 = (0..j).map(|k| lower[i * n + k] * lower[j * n + k]).sum();
                let residual = cov[i * n + j] - dot;
                if i == j {
                    if residual.is_nan() || residual <= 0.0 {
                        return Err(CholeskyError::NotPositiveDefinite {
                            row: i,
                            pivot: residual,
                        });
                    }
                    lower[i * n + i] = residual.sqrt();
                } else {
                    lower[i * n + j] = residual / lower[j * n + j];
                }
            }
        }
        Ok(Self { n, lower })
    }

    /// Wrap an explicit lower-triangular factor (row-major `n×n`).
    ///
    /// Entries above the diagonal are ignored and stored as zero.
    pub fn from_lower(lower: &[f64], n: usize) -> Result<Self, CholeskyError> {
        if lower.len() != n * n {
            return Err(CholeskyError::LengthMismatch {
                expected: n * n,
                actual: lower.len(),
            });
        }
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n..=i * n + i].copy_from_slice(&lower[i * n..=i * n + i]);
        }
        Ok(Self { n, lower: data })
    }

    /// The all-zero factor, used where the covariance vanishes identically.
    pub fn zero(n: usize) -> Self {
        Self {
            n,
            lower: vec![0.0; n * n],
        }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Entry `L[i][j]` (zero above the diagonal or out of range).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i >= self.n || j > i {
            return 0.0;
        }
        self.lower[i * self.n + j]
    }

    /// Row-major storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.lower
    }

    /// Reconstruct `L·Lᵀ` (row-major).
    pub fn covariance(&self) -> Vec<f64> {
        let n = self.n;
        let mut cov = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                let kmax = i.min(j);
                cov[i * n + j] = (0..=kmax)
                    .map(|k| self.lower[i * n + k] * self.lower[j * n + k])
                    .sum();
            }
        }
        cov
    }

    /// `out[i] = Σ_{j<=i} L[i][j] · input[j]`.
    ///
    /// Caller guarantees both slices have length [`dim()`](Self::dim).
    pub(crate) fn apply(&self, input: &[Complex64], out: &mut [Complex64]) {
        let n = self.n;
        for (i, slot) in out.iter_mut().enumerate().take(n) {
            let row = &self.lower[i * n..=i * n + i];
            *slot = row
                .iter()
                .zip(input)
                .fold(Complex64::new(0.0, 0.0), |acc, (&l, &x)| acc + x * l);
        }
    }
}
