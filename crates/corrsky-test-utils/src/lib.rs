//! Test fixtures and mock types for corrsky development.
//!
//! Provides a mock [`HarmonicTransform`] ([`PackedTransform`]) that reads
//! coefficients straight out of a packed "map", plus shared fixtures in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use corrsky_core::ConfigError;
use corrsky_spectra::{Alm, Complex64, HarmonicTransform, RingWeights};

/// Mock map analysis for packed coefficient arrays.
///
/// A "map" is the l-major coefficient array of an [`Alm`] flattened as
/// `[re, im, re, im, ...]` (see [`pack_alm`]). Every coefficient is
/// multiplied by the weight of ring 0, so tests can check that weights
/// reach the transform.
#[derive(Clone, Copy, Debug, Default)]
pub struct PackedTransform;

impl HarmonicTransform for PackedTransform {
    fn map_to_alm(
        &self,
        map: &[f64],
        lmax: u32,
        weights: &RingWeights,
    ) -> Result<Alm, ConfigError> {
        let expected = 2 * Alm::len_for(lmax);
        if map.len() != expected {
            return Err(ConfigError::LengthMismatch {
                what: "packed map",
                expected,
                actual: map.len(),
            });
        }
        let w = weights.get(0).unwrap_or(1.0);
        let mut alm = Alm::zeros(lmax);
        for (a, pair) in alm.as_mut_slice().iter_mut().zip(map.chunks_exact(2)) {
            *a = Complex64::new(w * pair[0], w * pair[1]);
        }
        Ok(alm)
    }
}

/// Flatten `alm` into the packed layout read by [`PackedTransform`].
pub fn pack_alm(alm: &Alm) -> Vec<f64> {
    alm.as_slice().iter().flat_map(|a| [a.re, a.im]).collect()
}

/// Relative difference `|a - b| / max(|a|, |b|, tiny)`.
pub fn rel_diff(a: f64, b: f64) -> f64 {
    (a - b).abs() / a.abs().max(b.abs()).max(1e-300)
}
