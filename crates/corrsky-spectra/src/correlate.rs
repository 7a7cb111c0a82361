//! Target spectra and correlated harmonic coefficient generation.
//!
//! A [`SpectrumSet`] holds the target `C_l` for every pair of entries that
//! is correlated. At each multipole the pairs assemble into an `N×N`
//! covariance whose Cholesky factor turns `N` independent complex normals
//! into `N` coefficients with exactly that covariance.
//!
//! # Reproducibility
//!
//! [`CoefficientGenerator::generate`] splits the multipole range into as
//! many contiguous chunks as the pool has threads. Chunk `w` draws from
//! `ChaCha8Rng::seed_from_u64(seed)` on stream `w`, so the output depends
//! only on the seed and the worker count.

use std::collections::HashMap;
use std::f64::consts::FRAC_1_SQRT_2;

use corrsky_core::{ConfigError, EntryIndex, LRange};
use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use rustfft::num_complex::Complex64;

use crate::alm::Alm;
use crate::cholesky::CholeskyFactor;
use crate::error::GenerateError;
use crate::transform::SpectrumTransform;

// ── SpectrumSet ────────────────────────────────────────────────────

/// Target spectra keyed by unordered entry pairs.
///
/// Keys are stored as `(min, max)`; insertion order is preserved. A pair
/// with no spectrum has zero cross-covariance at every multipole.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpectrumSet {
    entries: usize,
    spectra: IndexMap<(EntryIndex, EntryIndex), Vec<f64>>,
}

impl SpectrumSet {
    /// An empty set over `entry_count` entries.
    pub fn new(entry_count: usize) -> Self {
        Self {
            entries: entry_count,
            spectra: IndexMap::new(),
        }
    }

    /// Number of entries the covariance matrices span.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Number of stored pair spectra.
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// Returns `true` if no spectrum is stored.
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    fn key(&self, i: EntryIndex, j: EntryIndex) -> Result<(EntryIndex, EntryIndex), GenerateError> {
        for e in [i, j] {
            if e.index() >= self.entries {
                return Err(GenerateError::EntryOutOfRange {
                    entry: e,
                    count: self.entries,
                });
            }
        }
        Ok(if i <= j { (i, j) } else { (j, i) })
    }

    /// Store `C_l` (indexed by `l` from 0) for the pair `(i, j)`.
    ///
    /// Returns the spectrum previously stored for the pair, if any.
    pub fn insert(
        &mut self,
        i: EntryIndex,
        j: EntryIndex,
        cl: Vec<f64>,
    ) -> Result<Option<Vec<f64>>, GenerateError> {
        let key = self.key(i, j)?;
        Ok(self.spectra.insert(key, cl))
    }

    /// Spectrum of the pair, in either order.
    pub fn get(&self, i: EntryIndex, j: EntryIndex) -> Option<&[f64]> {
        let key = self.key(i, j).ok()?;
        self.spectra.get(&key).map(Vec::as_slice)
    }

    /// Stored pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = ((EntryIndex, EntryIndex), &[f64])> + '_ {
        self.spectra.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Symmetric covariance at multipole `l` (row-major, `N×N`).
    ///
    /// Missing pairs and spectra shorter than `l + 1` contribute zero.
    pub fn covariance_at(&self, l: u32) -> Vec<f64> {
        let n = self.entries;
        let mut cov = vec![0.0; n * n];
        for (&(i, j), cl) in &self.spectra {
            let value = cl.get(l as usize).copied().unwrap_or(0.0);
            let (i, j) = (i.index(), j.index());
            cov[i * n + j] = value;
            cov[j * n + i] = value;
        }
        cov
    }

    /// Replace every spectrum by its correlation function.
    pub fn to_correlation(&self) -> Result<Self, GenerateError> {
        self.map_transform(|t, v| t.to_correlation(v))
    }

    /// Replace every correlation function by its spectrum.
    pub fn to_spectrum(&self) -> Result<Self, GenerateError> {
        self.map_transform(|t, v| t.to_spectrum(v))
    }

    fn map_transform<F>(&self, f: F) -> Result<Self, GenerateError>
    where
        F: Fn(&SpectrumTransform, &[f64]) -> Result<Vec<f64>, ConfigError>,
    {
        let mut plans: HashMap<usize, SpectrumTransform> = HashMap::new();
        let mut spectra = IndexMap::with_capacity(self.spectra.len());
        for (key, values) in &self.spectra {
            let plan = plans
                .entry(values.len())
                .or_insert_with(|| SpectrumTransform::new(values.len()));
            spectra.insert(*key, f(plan, values)?);
        }
        Ok(Self {
            entries: self.entries,
            spectra,
        })
    }
}

// ── correlate ──────────────────────────────────────────────────────

/// Impose the covariance `L·Lᵀ` on `N` independent coefficients.
///
/// `out[i] = Σ_{j<=i} L[i][j] · independent[j]`, applied to the real and
/// imaginary parts alike.
pub fn correlate(
    factor: &CholeskyFactor,
    independent: &[Complex64],
) -> Result<Vec<Complex64>, GenerateError> {
    if independent.len() != factor.dim() {
        return Err(GenerateError::LengthMismatch {
            expected: factor.dim(),
            actual: independent.len(),
        });
    }
    let mut out = vec![Complex64::new(0.0, 0.0); factor.dim()];
    factor.apply(independent, &mut out);
    Ok(out)
}

/// One unit-variance complex normal for azimuthal order `m`.
///
/// `m = 0` coefficients of a real field are real; for `m > 0` the unit
/// variance is split evenly between real and imaginary parts.
fn draw_unit<R: Rng>(rng: &mut R, m: u32) -> Complex64 {
    let re: f64 = rng.sample(StandardNormal);
    if m == 0 {
        Complex64::new(re, 0.0)
    } else {
        let im: f64 = rng.sample(StandardNormal);
        Complex64::new(re * FRAC_1_SQRT_2, im * FRAC_1_SQRT_2)
    }
}

// ── CoefficientGenerator ───────────────────────────────────────────

/// Per-multipole Cholesky factors over a multipole range.
#[derive(Clone, Debug)]
pub struct CoefficientGenerator {
    lrange: LRange,
    entries: usize,
    factors: Vec<CholeskyFactor>,
}

/// Coefficients produced by one worker: rows for `lo..hi`, one buffer per
/// entry, in `Alm` storage order.
struct Chunk {
    lo: u32,
    rows: Vec<Vec<Complex64>>,
}

impl CoefficientGenerator {
    /// Factor the covariance of `spectra` at every multipole of `lrange`.
    ///
    /// A covariance that vanishes identically gets a zero factor, so those
    /// multipoles come out as zero coefficients.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `lrange` is inverted or a covariance is not
    /// positive definite.
    pub fn new(spectra: &SpectrumSet, lrange: LRange) -> Result<Self, GenerateError> {
        lrange.check_order("lrange")?;
        let n = spectra.entry_count();
        let mut factors = Vec::with_capacity(lrange.len());
        for l in lrange.iter() {
            let cov = spectra.covariance_at(l);
            if cov.iter().all(|&c| c == 0.0) {
                tracing::debug!(l, "zero covariance, coefficients set to zero");
                factors.push(CholeskyFactor::zero(n));
                continue;
            }
            let factor = CholeskyFactor::decompose(&cov, n)
                .map_err(|source| GenerateError::Cholesky { l, source })?;
            factors.push(factor);
        }
        tracing::info!(
            entries = n,
            lmin = lrange.lmin,
            lmax = lrange.lmax,
            "covariance matrices factored"
        );
        Ok(Self {
            lrange,
            entries: n,
            factors,
        })
    }

    /// Use precomputed factors, one per multipole of `lrange`.
    pub fn from_factors(
        lrange: LRange,
        factors: Vec<CholeskyFactor>,
    ) -> Result<Self, GenerateError> {
        lrange.check_order("lrange")?;
        if factors.len() != lrange.len() {
            return Err(GenerateError::FactorCount {
                expected: lrange.len(),
                actual: factors.len(),
            });
        }
        let entries = factors.first().map_or(0, CholeskyFactor::dim);
        if let Some(bad) = factors.iter().find(|f| f.dim() != entries) {
            return Err(GenerateError::LengthMismatch {
                expected: entries,
                actual: bad.dim(),
            });
        }
        Ok(Self {
            lrange,
            entries,
            factors,
        })
    }

    /// Multipole range covered.
    pub fn lrange(&self) -> LRange {
        self.lrange
    }

    /// Number of correlated entries.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Factor at multipole `l`.
    pub fn factor(&self, l: u32) -> Option<&CholeskyFactor> {
        if !self.lrange.contains(l) {
            return None;
        }
        self.factors.get((l - self.lrange.lmin) as usize)
    }

    /// Draw one set of correlated coefficients per entry.
    ///
    /// Coefficients below `lrange.lmin` are zero. The result is identical
    /// for identical `seed` and pool size.
    pub fn generate(&self, seed: u64, pool: &rayon::ThreadPool) -> Vec<Alm> {
        let workers = pool.current_num_threads().max(1);
        let total = self.lrange.len();
        let lmin = self.lrange.lmin;

        let chunks: Vec<Chunk> = pool.install(|| {
            (0..workers)
                .into_par_iter()
                .map(|w| {
                    let lo = lmin + (w * total / workers) as u32;
                    let hi = lmin + ((w + 1) * total / workers) as u32;
                    self.generate_chunk(seed, w, lo, hi)
                })
                .collect()
        });

        let mut alms: Vec<Alm> = (0..self.entries)
            .map(|_| Alm::zeros(self.lrange.lmax))
            .collect();
        for chunk in chunks {
            let start = Alm::row_start(chunk.lo);
            for (alm, rows) in alms.iter_mut().zip(chunk.rows) {
                alm.as_mut_slice()[start..start + rows.len()].copy_from_slice(&rows);
            }
        }
        tracing::info!(
            entries = self.entries,
            workers,
            seed,
            "correlated coefficients generated"
        );
        alms
    }

    fn generate_chunk(&self, seed: u64, worker: usize, lo: u32, hi: u32) -> Chunk {
        let n = self.entries;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(worker as u64);

        let len = Alm::row_start(hi) - Alm::row_start(lo);
        let mut rows: Vec<Vec<Complex64>> = (0..n).map(|_| Vec::with_capacity(len)).collect();
        let zero = Complex64::new(0.0, 0.0);
        let mut independent = vec![zero; n];
        let mut correlated = vec![zero; n];

        for l in lo..hi {
            let factor = &self.factors[(l - self.lrange.lmin) as usize];
            for m in 0..=l {
                for x in independent.iter_mut() {
                    *x = draw_unit(&mut rng, m);
                }
                factor.apply(&independent, &mut correlated);
                for (row, &c) in rows.iter_mut().zip(&correlated) {
                    row.push(c);
                }
            }
        }
        tracing::debug!(worker, lo, hi, "chunk generated");
        Chunk { lo, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corrsky_core::WorkerConfig;

    fn e(n: u32) -> EntryIndex {
        EntryIndex(n)
    }

    fn two_entry_set(lmax: usize) -> SpectrumSet {
        let mut set = SpectrumSet::new(2);
        set.insert(e(0), e(0), vec![1.0; lmax + 1]).unwrap();
        set.insert(e(1), e(1), vec![2.0; lmax + 1]).unwrap();
        set.insert(e(1), e(0), vec![0.5; lmax + 1]).unwrap();
        set
    }

    // ── SpectrumSet ─────────────────────────────────────────────

    #[test]
    fn pair_order_is_irrelevant() {
        let set = two_entry_set(4);
        assert_eq!(set.get(e(0), e(1)), set.get(e(1), e(0)));
        assert_eq!(set.get(e(0), e(1)).unwrap()[0], 0.5);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn insert_replaces_and_returns_previous() {
        let mut set = SpectrumSet::new(1);
        assert_eq!(set.insert(e(0), e(0), vec![1.0]).unwrap(), None);
        assert_eq!(set.insert(e(0), e(0), vec![2.0]).unwrap(), Some(vec![1.0]));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn insert_out_of_range() {
        let mut set = SpectrumSet::new(2);
        assert_eq!(
            set.insert(e(0), e(2), vec![1.0]),
            Err(GenerateError::EntryOutOfRange {
                entry: e(2),
                count: 2
            })
        );
    }

    #[test]
    fn covariance_is_symmetric_and_zero_filled() {
        let mut set = SpectrumSet::new(3);
        set.insert(e(0), e(0), vec![1.0, 1.0]).unwrap();
        set.insert(e(2), e(0), vec![0.0, 0.3]).unwrap();
        let cov = set.covariance_at(1);
        assert_eq!(cov, vec![1.0, 0.0, 0.3, 0.0, 0.0, 0.0, 0.3, 0.0, 0.0]);
        // Beyond the stored length everything is zero.
        assert!(set.covariance_at(5).iter().all(|&c| c == 0.0));
    }

    #[test]
    fn correlation_round_trip_through_set() {
        let set = two_entry_set(15);
        let back = set.to_correlation().unwrap().to_spectrum().unwrap();
        for ((k1, a), (k2, b)) in set.iter().zip(back.iter()) {
            assert_eq!(k1, k2);
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1e-10);
            }
        }
    }

    // ── correlate ───────────────────────────────────────────────

    #[test]
    fn correlate_applies_lower_triangle() {
        let factor = CholeskyFactor::from_lower(&[1.0, 0.0, 0.5, 2.0], 2).unwrap();
        let out = correlate(
            &factor,
            &[Complex64::new(2.0, 1.0), Complex64::new(-1.0, 4.0)],
        )
        .unwrap();
        assert_eq!(out[0], Complex64::new(2.0, 1.0));
        assert_eq!(out[1], Complex64::new(1.0 - 2.0, 0.5 + 8.0));
    }

    #[test]
    fn correlate_length_mismatch() {
        let factor = CholeskyFactor::zero(3);
        assert_eq!(
            correlate(&factor, &[Complex64::new(0.0, 0.0); 2]),
            Err(GenerateError::LengthMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn empirical_covariance_converges() {
        let factor = CholeskyFactor::decompose(&[1.0, 0.6, 0.6, 2.0], 2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let samples = 40_000;
        let (mut s00, mut s01, mut s11) = (0.0, 0.0, 0.0);
        for _ in 0..samples {
            let x = [draw_unit(&mut rng, 0), draw_unit(&mut rng, 0)];
            let y = correlate(&factor, &x).unwrap();
            s00 += y[0].re * y[0].re;
            s01 += y[0].re * y[1].re;
            s11 += y[1].re * y[1].re;
        }
        let n = samples as f64;
        let tol = 5.0 / n.sqrt() * 2.0;
        assert!((s00 / n - 1.0).abs() < tol);
        assert!((s01 / n - 0.6).abs() < tol);
        assert!((s11 / n - 2.0).abs() < tol);
    }

    // ── CoefficientGenerator ────────────────────────────────────

    #[test]
    fn generator_rejects_indefinite_covariance() {
        let mut set = SpectrumSet::new(2);
        set.insert(e(0), e(0), vec![1.0; 4]).unwrap();
        set.insert(e(1), e(1), vec![1.0; 4]).unwrap();
        set.insert(e(0), e(1), vec![3.0; 4]).unwrap();
        assert!(matches!(
            CoefficientGenerator::new(&set, LRange::new(1, 3)),
            Err(GenerateError::Cholesky { l: 1, .. })
        ));
    }

    #[test]
    fn generator_rejects_inverted_range() {
        let set = two_entry_set(4);
        assert!(matches!(
            CoefficientGenerator::new(&set, LRange::new(3, 1)),
            Err(GenerateError::Config(ConfigError::RangeOrder { .. }))
        ));
    }

    #[test]
    fn zero_covariance_gives_zero_factor() {
        let mut set = SpectrumSet::new(1);
        set.insert(e(0), e(0), vec![0.0, 0.0, 1.0]).unwrap();
        let generator = CoefficientGenerator::new(&set, LRange::new(1, 2)).unwrap();
        assert_eq!(generator.factor(1), Some(&CholeskyFactor::zero(1)));
        assert_eq!(generator.factor(2).unwrap().get(0, 0), 1.0);
        assert!(generator.factor(0).is_none());
    }

    #[test]
    fn from_factors_checks_count() {
        let err = CoefficientGenerator::from_factors(
            LRange::new(2, 4),
            vec![CholeskyFactor::zero(1); 2],
        );
        assert_eq!(
            err.unwrap_err(),
            GenerateError::FactorCount {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn below_lmin_is_zero_and_m0_is_real() {
        let set = two_entry_set(20);
        let generator = CoefficientGenerator::new(&set, LRange::new(5, 20)).unwrap();
        let pool = WorkerConfig::fixed(3).build_pool().unwrap();
        let alms = generator.generate(11, &pool);
        assert_eq!(alms.len(), 2);
        for alm in &alms {
            assert_eq!(alm.lmax(), 20);
            for (l, m, a) in alm.iter() {
                if l < 5 {
                    assert_eq!(a, Complex64::new(0.0, 0.0));
                } else if m == 0 {
                    assert_eq!(a.im, 0.0);
                    assert_ne!(a.re, 0.0);
                }
            }
        }
    }

    #[test]
    fn reproducible_for_seed_and_workers() {
        let set = two_entry_set(40);
        let generator = CoefficientGenerator::new(&set, LRange::new(2, 40)).unwrap();
        let pool = WorkerConfig::fixed(4).build_pool().unwrap();
        let a = generator.generate(99, &pool);
        let b = generator.generate(99, &pool);
        assert_eq!(a, b);
        let c = generator.generate(100, &pool);
        assert_ne!(a, c);
    }

    #[test]
    fn chunk_rows_are_filled_to_length() {
        let set = two_entry_set(12);
        let generator = CoefficientGenerator::new(&set, LRange::new(2, 12)).unwrap();
        let chunk = generator.generate_chunk(5, 1, 4, 9);
        let len = Alm::row_start(9) - Alm::row_start(4);
        assert_eq!(chunk.rows.len(), 2);
        for row in &chunk.rows {
            assert_eq!(row.len(), len);
            assert_eq!(row.capacity(), len);
        }
    }

    #[test]
    fn generated_cross_spectrum_matches_target() {
        let lmax = 150;
        let set = two_entry_set(lmax);
        let generator = CoefficientGenerator::new(&set, LRange::new(2, lmax as u32)).unwrap();
        let pool = WorkerConfig::fixed(2).build_pool().unwrap();
        let alms = generator.generate(2024, &pool);

        // Pool all multipoles: each contributes 2l+1 real modes.
        let (mut c00, mut c01, mut c11, mut modes) = (0.0, 0.0, 0.0, 0.0);
        for l in 2..=lmax as u32 {
            let (a, b) = (alms[0].row(l).unwrap(), alms[1].row(l).unwrap());
            for m in 0..=l as usize {
                let w = if m == 0 { 1.0 } else { 2.0 };
                c00 += w * (a[m] * a[m].conj()).re;
                c01 += w * (a[m] * b[m].conj()).re;
                c11 += w * (b[m] * b[m].conj()).re;
            }
            modes += (2 * l + 1) as f64;
        }
        let tol = 5.0 * (2.0 / modes).sqrt() * 2.0;
        assert!((c00 / modes - 1.0).abs() < tol, "{}", c00 / modes);
        assert!((c01 / modes - 0.5).abs() < tol, "{}", c01 / modes);
        assert!((c11 / modes - 2.0).abs() < tol, "{}", c11 / modes);
    }
}
