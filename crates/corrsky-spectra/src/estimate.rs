//! Recovery of auto and cross power spectra from harmonic coefficients.
//!
//! For real fields the sum over `m = -l..l` folds onto `m >= 0`:
//!
//! ```text
//! C_l = (Re(a_l0 b_l0*) + 2 Σ_{m=1}^{M} Re(a_lm b_lm*)) / (2l + 1)
//! ```
//!
//! with `M = l`, or `M = min(cutoff, l)` when an azimuthal cutoff is set.
//! The normalization stays `2l + 1` under a cutoff.
//!
//! Pairs are enumerated row-major over `i <= j`: pair `k` of `N` entries is
//! `(0,0), (0,1), .., (0,N-1), (1,1), ..`. See [`pair_index`] and
//! [`pair_of`].

use corrsky_core::{
    check_output_range, ConfigError, EntryIndex, FieldIndex, IndexError, LRange,
};
use rayon::prelude::*;

use crate::alm::Alm;
use crate::error::EstimateError;

/// Number of ordered pairs `i <= j` over `n` entries.
pub fn pair_count(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Linear pair index of `(i, j)`, `i <= j < n`.
pub fn pair_index(i: usize, j: usize, n: usize) -> usize {
    let (i, j) = if i <= j { (i, j) } else { (j, i) };
    row_start(i, n) + (j - i)
}

fn row_start(i: usize, n: usize) -> usize {
    i * n - i * i.saturating_sub(1) / 2
}

/// Inverse of [`pair_index`]: the pair `(i, j)` with index `k`.
pub fn pair_of(k: usize, n: usize) -> (usize, usize) {
    // Closed form, then integer correction for rounding at row boundaries.
    let b = (2 * n + 1) as f64;
    let guess = ((b - (b * b - 8.0 * k as f64).max(0.0).sqrt()) / 2.0).floor();
    let mut i = (guess.max(0.0) as usize).min(n.saturating_sub(1));
    while i + 1 < n && row_start(i + 1, n) <= k {
        i += 1;
    }
    while i > 0 && row_start(i, n) > k {
        i -= 1;
    }
    (i, i + (k - row_start(i, n)))
}

/// Estimate the cross spectrum of `a` and `b` over `out`.
///
/// # Errors
///
/// Returns `Err` if `out` is inverted, `m_cutoff` exceeds `out.lmin`, or
/// either coefficient set stops below `out.lmax`.
pub fn estimate_pair(
    a: &Alm,
    b: &Alm,
    out: LRange,
    m_cutoff: Option<u32>,
) -> Result<Vec<f64>, EstimateError> {
    out.check_order("lrange_out")?;
    check_output_range(&out, &out, m_cutoff)?;
    let available = a.lmax().min(b.lmax());
    if out.lmax > available {
        return Err(ConfigError::LmaxExceeded {
            requested: out.lmax,
            available,
        }
        .into());
    }
    Ok(cross_spectrum(a, b, out, m_cutoff))
}

/// Caller guarantees both sets reach `out.lmax`.
fn cross_spectrum(a: &Alm, b: &Alm, out: LRange, m_cutoff: Option<u32>) -> Vec<f64> {
    out.iter()
        .map(|l| {
            let mmax = m_cutoff.map_or(l, |c| c.min(l)) as usize;
            let (ra, rb) = match (a.row(l), b.row(l)) {
                (Some(ra), Some(rb)) => (ra, rb),
                _ => return 0.0,
            };
            let mut sum = (ra[0] * rb[0].conj()).re;
            for m in 1..=mmax {
                sum += 2.0 * (ra[m] * rb[m].conj()).re;
            }
            sum / (2 * l + 1) as f64
        })
        .collect()
}

/// Every auto and cross spectrum among a set of entries.
#[derive(Clone, Debug, PartialEq)]
pub struct RecoveredSpectra {
    lrange: LRange,
    entries: usize,
    spectra: Vec<Option<Vec<f64>>>,
}

impl RecoveredSpectra {
    /// Multipole range of every spectrum.
    pub fn lrange(&self) -> LRange {
        self.lrange
    }

    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Number of pairs (present or absent).
    pub fn pair_count(&self) -> usize {
        self.spectra.len()
    }

    /// Spectrum of the pair `(i, j)` in either order; `None` if either side
    /// had no coefficients or an index is out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<&[f64]> {
        if i >= self.entries || j >= self.entries {
            return None;
        }
        self.spectra
            .get(pair_index(i, j, self.entries))?
            .as_deref()
    }

    /// Spectrum by linear pair index.
    pub fn get_pair(&self, k: usize) -> Option<&[f64]> {
        self.spectra.get(k)?.as_deref()
    }

    /// `Cl-f{fi}z{zi}f{fj}z{zj}` for every pair, in pair order.
    pub fn labels(&self, index: &FieldIndex) -> Result<Vec<String>, IndexError> {
        (0..self.spectra.len())
            .map(|k| {
                let (i, j) = pair_of(k, self.entries);
                let (fi, zi) = index.name_of(EntryIndex(i as u32))?;
                let (fj, zj) = index.name_of(EntryIndex(j as u32))?;
                Ok(format!("Cl-f{fi}z{zi}f{fj}z{zj}"))
            })
            .collect()
    }

    /// Pairs in index order with their spectra.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), Option<&[f64]>)> + '_ {
        self.spectra
            .iter()
            .enumerate()
            .map(move |(k, s)| (pair_of(k, self.entries), s.as_deref()))
    }
}

/// Recover all `N(N+1)/2` spectra from per-entry coefficients.
///
/// A pair with an absent side stays absent. Pairs are estimated in
/// parallel on `pool`, each writing only its own slot.
pub fn estimate_all(
    alms: &[Option<Alm>],
    out: LRange,
    m_cutoff: Option<u32>,
    pool: &rayon::ThreadPool,
) -> Result<RecoveredSpectra, EstimateError> {
    out.check_order("lrange_out")?;
    check_output_range(&out, &out, m_cutoff)?;
    for (entry, alm) in alms.iter().enumerate() {
        if let Some(alm) = alm {
            if alm.lmax() < out.lmax {
                return Err(EstimateError::AlmTooShort {
                    entry,
                    lmax: alm.lmax(),
                    requested: out.lmax,
                });
            }
        }
    }

    let n = alms.len();
    let mut spectra: Vec<Option<Vec<f64>>> = vec![None; pair_count(n)];
    pool.install(|| {
        spectra.par_iter_mut().enumerate().for_each(|(k, slot)| {
            let (i, j) = pair_of(k, n);
            if let (Some(a), Some(b)) = (&alms[i], &alms[j]) {
                *slot = Some(cross_spectrum(a, b, out, m_cutoff));
            }
        });
    });

    let present = spectra.iter().filter(|s| s.is_some()).count();
    tracing::info!(
        entries = n,
        pairs = spectra.len(),
        present,
        lmin = out.lmin,
        lmax = out.lmax,
        "spectra recovered"
    );
    Ok(RecoveredSpectra {
        lrange: out,
        entries: n,
        spectra,
    })
}
