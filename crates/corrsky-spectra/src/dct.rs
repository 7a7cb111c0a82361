//! Unnormalized discrete cosine transforms of types II and III.
//!
//! Both transforms are evaluated through a complex FFT of length `2n`:
//!
//! - DCT-II: `y_k = 2 Σ_j x_j cos(π k (2j+1) / 2n)`
//! - DCT-III: `y_k = x_0 + 2 Σ_{j≥1} x_j cos(π j (2k+1) / 2n)`
//!
//! With these conventions `dct3(dct2(x)) == 2n · x`.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use corrsky_core::ConfigError;
use rustfft::{num_complex::Complex64, Fft, FftPlanner};

/// A reusable pair of FFT plans for cosine transforms of one length.
///
/// Plans are immutable once built and can be shared across threads.
pub struct DctPlan {
    n: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    /// `e^{iπk/2n}` for `k` in `0..n`.
    twiddles: Vec<Complex64>,
}

impl fmt::Debug for DctPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DctPlan").field("n", &self.n).finish()
    }
}

impl DctPlan {
    /// Plan transforms of length `n`.
    pub fn new(n: usize) -> Self {
        let fft_len = 2 * n.max(1);
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);
        let twiddles = (0..n)
            .map(|k| Complex64::from_polar(1.0, PI * k as f64 / (2 * n) as f64))
            .collect();
        Self {
            n,
            forward,
            inverse,
            twiddles,
        }
    }

    /// Transform length.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Returns `true` for a zero-length plan.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    fn check_len(&self, input: &[f64]) -> Result<(), ConfigError> {
        if input.len() != self.n {
            return Err(ConfigError::LengthMismatch {
                what: "dct input",
                expected: self.n,
                actual: input.len(),
            });
        }
        Ok(())
    }

    /// DCT-II of `input`, every output multiplied by `scale`.
    pub fn dct2(&self, input: &[f64], scale: f64) -> Result<Vec<f64>, ConfigError> {
        self.check_len(input)?;
        let n = self.n;
        if n == 0 {
            return Ok(Vec::new());
        }

        // Even extension [x_0 .. x_{n-1}, x_{n-1} .. x_0].
        let mut buf: Vec<Complex64> = input
            .iter()
            .chain(input.iter().rev())
            .map(|&x| Complex64::new(x, 0.0))
            .collect();
        self.forward.process(&mut buf);

        Ok(buf[..n]
            .iter()
            .zip(&self.twiddles)
            .map(|(v, w)| scale * (*v * w.conj()).re)
            .collect())
    }

    /// DCT-III of `input`, every output multiplied by `scale`.
    pub fn dct3(&self, input: &[f64], scale: f64) -> Result<Vec<f64>, ConfigError> {
        self.check_len(input)?;
        let n = self.n;
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![Complex64::new(0.0, 0.0); 2 * n];
        for (j, (&x, w)) in input.iter().zip(&self.twiddles).enumerate() {
            let weight = if j == 0 { 1.0 } else { 2.0 };
            buf[j] = *w * (weight * x);
        }
        self.inverse.process(&mut buf);

        Ok(buf[..n].iter().map(|v| scale * v.re).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dct2(x: &[f64]) -> Vec<f64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                2.0 * x
                    .iter()
                    .enumerate()
                    .map(|(j, &v)| v * (PI * (k * (2 * j + 1)) as f64 / (2 * n) as f64).cos())
                    .sum::<f64>()
            })
            .collect()
    }

    fn naive_dct3(x: &[f64]) -> Vec<f64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                x[0] + 2.0
                    * x.iter()
                        .enumerate()
                        .skip(1)
                        .map(|(j, &v)| v * (PI * (j * (2 * k + 1)) as f64 / (2 * n) as f64).cos())
                        .sum::<f64>()
            })
            .collect()
    }

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() <= tol, "index {i}: {x} vs {y}");
        }
    }

    #[test]
    fn dct2_matches_direct_sum() {
        let x = [1.0, -0.5, 2.25, 0.0, 3.5, -1.0, 0.125];
        let plan = DctPlan::new(x.len());
        assert_close(&plan.dct2(&x, 1.0).unwrap(), &naive_dct2(&x), 1e-12);
    }

    #[test]
    fn dct3_matches_direct_sum() {
        let x = [0.3, 1.0, -2.0, 0.7, 0.0, 4.0];
        let plan = DctPlan::new(x.len());
        assert_close(&plan.dct3(&x, 1.0).unwrap(), &naive_dct3(&x), 1e-12);
    }

    #[test]
    fn dct3_inverts_dct2_up_to_2n() {
        let x: Vec<f64> = (0..16).map(|i| ((i * 7) % 5) as f64 - 2.0).collect();
        let plan = DctPlan::new(x.len());
        let y = plan.dct2(&x, 1.0).unwrap();
        let back = plan.dct3(&y, 1.0 / (2 * x.len()) as f64).unwrap();
        assert_close(&back, &x, 1e-12);
    }

    #[test]
    fn scale_is_applied() {
        let x = [1.0, 2.0, 3.0];
        let plan = DctPlan::new(3);
        let plain = plan.dct2(&x, 1.0).unwrap();
        let scaled = plan.dct2(&x, 0.5).unwrap();
        for (p, s) in plain.iter().zip(&scaled) {
            assert!((0.5 * p - s).abs() < 1e-14);
        }
    }

    #[test]
    fn empty_plan() {
        let plan = DctPlan::new(0);
        assert!(plan.is_empty());
        assert!(plan.dct2(&[], 1.0).unwrap().is_empty());
        assert!(plan.dct3(&[], 1.0).unwrap().is_empty());
    }

    #[test]
    fn wrong_length_rejected() {
        let plan = DctPlan::new(4);
        assert_eq!(
            plan.dct3(&[1.0; 3], 1.0),
            Err(ConfigError::LengthMismatch {
                what: "dct input",
                expected: 4,
                actual: 3
            })
        );
    }
}
