//! Benchmark profiles for the corrsky crates.
//!
//! - [`reference_index`]: galaxies and convergence over several bins.
//! - [`reference_spectra`]: a positive-definite spectrum set for it.
//! - [`reference_alms`]: coefficients generated from that set.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use corrsky_core::{EntryIndex, FieldIndex, FieldKind, IndexError, LRange};
use corrsky_spectra::{Alm, CoefficientGenerator, GenerateError, SpectrumSet};

/// Galaxies (field 1) and convergence (field 2) in `bins` redshift bins of
/// width 0.2. Entry `2b` is galaxies and `2b + 1` convergence of bin `b`.
pub fn reference_index(bins: u32) -> Result<FieldIndex, IndexError> {
    let mut builder = FieldIndex::builder().kind(2, FieldKind::Lensing);
    for b in 0..bins {
        let lo = 0.2 * f64::from(b);
        builder = builder
            .entry(1, b + 1)
            .entry(2, b + 1)
            .z_range(b + 1, lo, lo + 0.2);
    }
    builder.build()
}

/// Auto spectra `1 / (1 + l/50)` scaled per entry, with cross spectra at
/// correlation 0.3 between neighbouring entries.
pub fn reference_spectra(entries: usize, lmax: usize) -> Result<SpectrumSet, GenerateError> {
    let shape = |amp: f64| -> Vec<f64> { (0..=lmax).map(|l| amp / (1.0 + l as f64 / 50.0)).collect() };
    let amp = |i: usize| 1.0 + 0.1 * i as f64;
    let mut set = SpectrumSet::new(entries);
    for i in 0..entries {
        let e = EntryIndex(i as u32);
        set.insert(e, e, shape(amp(i)))?;
        if i > 0 {
            let rho = 0.3 * (amp(i - 1) * amp(i)).sqrt();
            set.insert(EntryIndex(i as u32 - 1), e, shape(rho))?;
        }
    }
    Ok(set)
}

/// One coefficient set per entry of [`reference_spectra`].
pub fn reference_alms(
    entries: usize,
    lmax: u32,
    seed: u64,
    pool: &rayon::ThreadPool,
) -> Result<Vec<Option<Alm>>, GenerateError> {
    let set = reference_spectra(entries, lmax as usize)?;
    let generator = CoefficientGenerator::new(&set, LRange::new(1, lmax))?;
    Ok(generator.generate(seed, pool).into_iter().map(Some).collect())
}
