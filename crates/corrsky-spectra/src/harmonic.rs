//! Seam to the external spherical-harmonic library.
//!
//! corrsky does not implement map analysis itself. A [`HarmonicTransform`]
//! supplied by the caller turns a pixel map into coefficients, optionally
//! with per-ring quadrature weights.

use std::fs;
use std::path::Path;

use corrsky_core::{warning, ConfigError};

use crate::alm::Alm;

/// Map analysis provided by a pixelization library.
pub trait HarmonicTransform: Sync {
    /// Coefficients up to `lmax` of a full-sky map.
    ///
    /// # Errors
    ///
    /// Implementations return `Err` if `map` does not match their
    /// pixelization or `weights` has the wrong number of rings.
    fn map_to_alm(&self, map: &[f64], lmax: u32, weights: &RingWeights)
        -> Result<Alm, ConfigError>;
}

/// Per-ring quadrature weights for map analysis.
///
/// Weights are stored as `1 + w`, with `w` the tabulated correction.
#[derive(Clone, Debug, PartialEq)]
pub struct RingWeights {
    values: Vec<f64>,
}

impl RingWeights {
    /// Weight 1 on every ring.
    pub fn uniform(rings: usize) -> Self {
        Self {
            values: vec![1.0; rings],
        }
    }

    /// Weights `1 + w` from tabulated corrections `w`.
    pub fn from_offsets(offsets: &[f64]) -> Self {
        Self {
            values: offsets.iter().map(|w| 1.0 + w).collect(),
        }
    }

    /// Read whitespace-separated corrections from a text file.
    ///
    /// Any failure (missing file, unparsable number, wrong count) falls
    /// back to uniform weights and records a warning.
    pub fn load(path: &Path, rings: usize) -> Self {
        match read_offsets(path, rings) {
            Ok(offsets) => {
                tracing::debug!(path = %path.display(), rings, "ring weights loaded");
                Self::from_offsets(&offsets)
            }
            Err(reason) => {
                warning::warn(format_args!(
                    "could not load ring weights from {}: {reason}; using 1.0 instead",
                    path.display()
                ));
                Self::uniform(rings)
            }
        }
    }

    /// Number of rings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no rings.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Weight of ring `ring`.
    pub fn get(&self, ring: usize) -> Option<f64> {
        self.values.get(ring).copied()
    }

    /// All weights.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

fn read_offsets(path: &Path, rings: usize) -> Result<Vec<f64>, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let offsets = text
        .split_whitespace()
        .map(|tok| tok.parse::<f64>().map_err(|e| format!("{tok:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    if offsets.len() != rings {
        return Err(format!("found {} values for {rings} rings", offsets.len()));
    }
    Ok(offsets)
}

/// Analyse every present map; absent maps stay absent.
pub fn recover_alms<T: HarmonicTransform + ?Sized>(
    maps: &[Option<Vec<f64>>],
    lmax: u32,
    transform: &T,
    weights: &RingWeights,
) -> Result<Vec<Option<Alm>>, ConfigError> {
    let alms = maps
        .iter()
        .map(|map| {
            map.as_deref()
                .map(|m| transform.map_to_alm(m, lmax, weights))
                .transpose()
        })
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(
        maps = maps.len(),
        present = alms.iter().filter(|a| a.is_some()).count(),
        lmax,
        "coefficients recovered from maps"
    );
    Ok(alms)
}
