//! Reusable registries, spectra and pixelizations.
//!
//! - [`galaxy_lensing_index`]: two galaxy and one lensing field type over
//!   two redshift bins, with ranges.
//! - [`power_law_set`]: a positive-definite set of auto and cross spectra.
//! - [`test_pixelization`]: a small equal-area grid.

use corrsky_core::{EntryIndex, FieldIndex, FieldKind};
use corrsky_select::BandPixelization;
use corrsky_spectra::SpectrumSet;

/// Field 1 and 3 are galaxies, field 2 is lensing. Bin 1 is
/// `[0.0, 0.5)` and bin 2 is `[0.5, 1.0)`.
///
/// Entries: 0 = f1z1, 1 = f2z1, 2 = f1z2, 3 = f2z2, 4 = f3z2.
pub fn galaxy_lensing_index() -> FieldIndex {
    FieldIndex::builder()
        .entry(1, 1)
        .entry(2, 1)
        .entry(1, 2)
        .entry(2, 2)
        .entry(3, 2)
        .kind(2, FieldKind::Lensing)
        .z_range(1, 0.0, 0.5)
        .z_range(2, 0.5, 1.0)
        .build()
        .expect("fixture registry is valid")
}

/// `amp / (1 + l / 50)` for `l` in `0..=lmax`.
pub fn power_law(lmax: usize, amp: f64) -> Vec<f64> {
    (0..=lmax).map(|l| amp / (1.0 + l as f64 / 50.0)).collect()
}

/// Auto spectra `power_law(lmax, 1 + i)` for every entry and cross
/// spectra `power_law(lmax, rho * sqrt((1 + i)(1 + j)))` between
/// neighbouring entries. Positive definite for `|rho| < 0.5`.
pub fn power_law_set(entries: usize, lmax: usize, rho: f64) -> SpectrumSet {
    let mut set = SpectrumSet::new(entries);
    let e = |i: usize| EntryIndex(i as u32);
    for i in 0..entries {
        set.insert(e(i), e(i), power_law(lmax, 1.0 + i as f64))
            .expect("fixture spectrum fits");
    }
    for i in 1..entries {
        let amp = rho * ((i as f64) * (1.0 + i as f64)).sqrt();
        set.insert(e(i - 1), e(i), power_law(lmax, amp))
            .expect("fixture spectrum fits");
    }
    set
}

/// `bands * 2 * bands` equal-area pixels.
pub fn test_pixelization(bands: usize) -> BandPixelization {
    BandPixelization::new(bands, 2 * bands)
}

/// One `value`-filled map per entry.
pub fn constant_maps(entries: usize, pixels: usize, value: f64) -> Vec<Option<Vec<f64>>> {
    vec![Some(vec![value; pixels]); entries]
}
