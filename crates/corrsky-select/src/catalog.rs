//! Drawing galaxy catalogs from sampled count maps.
//!
//! Every galaxy gets a uniform position inside its pixel and a redshift
//! from the selection function. When the redshift bin also carries a
//! lensing entry, the galaxy is given the convergence and shear of its
//! pixel and a lensed ellipticity.

use rayon::prelude::*;

use corrsky_core::{
    warning, ConfigError, EntryIndex, FieldIndex, FieldKind, FieldName, RedshiftName,
};
use corrsky_spectra::Complex64;

use crate::ellipticity::{ellipticity, ShearMode};
use crate::error::{SamplingError, SelectionError};
use crate::selection::{MaskBit, RedshiftDraw, SelectionFunction};
use crate::sky::{rand_ang_in_pixel, AngularUnits, Pixelization, Pointing};
use crate::streams::{lane, StreamPurpose, WorkerStreams};

/// Convergence and shear maps of one lensing entry.
#[derive(Clone, Debug, PartialEq)]
pub struct LensingMaps {
    /// Convergence κ.
    pub kappa: Vec<f64>,
    /// First shear component.
    pub gamma1: Vec<f64>,
    /// Second shear component.
    pub gamma2: Vec<f64>,
}

impl LensingMaps {
    fn check(&self, npix: usize) -> Result<(), ConfigError> {
        for (what, len) in [
            ("convergence pixels", self.kappa.len()),
            ("shear 1 pixels", self.gamma1.len()),
            ("shear 2 pixels", self.gamma2.len()),
        ] {
            if len != npix {
                return Err(ConfigError::LengthMismatch {
                    what,
                    expected: npix,
                    actual: len,
                });
            }
        }
        Ok(())
    }

    /// Complex shear at `pixel`.
    pub fn gamma(&self, pixel: usize) -> Complex64 {
        Complex64::new(self.gamma1[pixel], self.gamma2[pixel])
    }
}

/// Lensing quantities attached to a galaxy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GalaxyLensing {
    /// Convergence at the galaxy's pixel.
    pub kappa: f64,
    /// Shear at the galaxy's pixel.
    pub gamma: Complex64,
    /// Lensed image ellipticity.
    pub ellipticity: Complex64,
}

/// One galaxy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CatalogRow {
    /// Entry the galaxy was drawn from.
    pub entry: EntryIndex,
    /// Field type of the entry.
    pub field: FieldName,
    /// Redshift bin of the entry.
    pub redshift_bin: RedshiftName,
    /// Pixel containing the galaxy.
    pub pixel: usize,
    /// Position on the sky.
    pub position: Pointing,
    /// Redshift.
    pub z: f64,
    /// Lensing quantities, when the bin has a lensing entry.
    pub lensing: Option<GalaxyLensing>,
}

impl CatalogRow {
    /// Position in the requested output units.
    pub fn angles(&self, units: AngularUnits) -> (f64, f64) {
        units.convert(self.position)
    }
}

/// Settings for [`draw_catalog`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CatalogOptions {
    /// Per-component standard deviation of intrinsic ellipticities.
    pub ellipticity_sigma: f64,
    /// Shear or reduced shear.
    pub shear_mode: ShearMode,
    /// Value marking masked pixels in the count maps.
    pub sentinel: f64,
    /// Master seed of the catalog streams.
    pub seed: u64,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            ellipticity_sigma: 0.0,
            shear_mode: ShearMode::ReducedShear,
            sentinel: crate::galaxies::UNSEEN,
            seed: 42,
        }
    }
}

/// Number of galaxies held by a count map value.
///
/// Non-integer counts are truncated; the sentinel, negative and
/// non-finite values hold none.
pub fn galaxy_count(value: f64, sentinel: f64) -> usize {
    if value == sentinel || !value.is_finite() || value < 1.0 {
        0
    } else {
        value as usize
    }
}

/// Lensing entry of the redshift bin that holds `entry`, if any.
fn lensing_partner(
    index: &FieldIndex,
    entry: EntryIndex,
) -> Result<Option<EntryIndex>, SelectionError> {
    let (bin, _) = index.bin_fixed_position(entry)?;
    for &other in index.redshift_bin(bin)?.entries() {
        if index.kind_of(other)? == FieldKind::Lensing {
            return Ok(Some(other));
        }
    }
    Ok(None)
}

/// Draw every galaxy of every galaxy entry.
///
/// `counts` holds one sampled map per entry (see
/// [`sample_galaxies`](crate::galaxies::sample_galaxies)); `lensing` is
/// either empty or holds one slot per entry, filled for lensing entries.
/// Rows are ordered by entry, then pixel, and are identical for identical
/// seed and pool size.
///
/// # Errors
///
/// Returns `Err` on inconsistent lengths, when the selection cannot sample
/// redshifts, or when no position is found inside a pixel.
pub fn draw_catalog<P: Pixelization + ?Sized>(
    counts: &[Option<Vec<f64>>],
    lensing: &[Option<LensingMaps>],
    index: &FieldIndex,
    selection: &SelectionFunction,
    pix: &P,
    options: &CatalogOptions,
    pool: &rayon::ThreadPool,
) -> Result<Vec<CatalogRow>, SamplingError> {
    let npix = pix.pixel_count();
    let n = index.entry_count();
    if counts.len() != n {
        return Err(ConfigError::LengthMismatch {
            what: "count maps per entry",
            expected: n,
            actual: counts.len(),
        }
        .into());
    }
    if !lensing.is_empty() && lensing.len() != n {
        return Err(ConfigError::LengthMismatch {
            what: "lensing maps per entry",
            expected: n,
            actual: lensing.len(),
        }
        .into());
    }
    for maps in lensing.iter().flatten() {
        maps.check(npix)?;
    }
    if selection.pixel_count() != npix {
        return Err(ConfigError::LengthMismatch {
            what: "selection pixels",
            expected: npix,
            actual: selection.pixel_count(),
        }
        .into());
    }

    let streams = WorkerStreams::for_pool(options.seed, pool);
    let mut rows = Vec::new();
    for (entry, field, redshift_bin) in index.iter() {
        if index.kind_of(entry).map_err(SelectionError::from)? != FieldKind::Galaxies {
            continue;
        }
        let Some(map) = counts[entry.index()].as_ref() else {
            continue;
        };
        if map.len() != npix {
            return Err(ConfigError::LengthMismatch {
                what: "count map pixels",
                expected: npix,
                actual: map.len(),
            }
            .into());
        }
        let lens = match lensing_partner(index, entry)? {
            Some(other) => lensing.get(other.index()).and_then(Option::as_ref),
            None => None,
        };
        let label = index.label(entry).map_err(SelectionError::from)?;
        let stream_lane = lane(StreamPurpose::Catalog, entry);

        let chunks: Result<Vec<(Vec<CatalogRow>, usize)>, SamplingError> = pool.install(|| {
            (0..streams.workers())
                .into_par_iter()
                .map(|w| -> Result<(Vec<CatalogRow>, usize), SamplingError> {
                    let mut rng = streams.stream(stream_lane, w);
                    let mut out = Vec::new();
                    let mut skipped = 0;
                    for pixel in streams.chunk(w, npix) {
                        let n = galaxy_count(map[pixel], options.sentinel);
                        if n == 0 {
                            continue;
                        }
                        if selection.mask_bit(entry, pixel)? != MaskBit::Valid {
                            skipped += n;
                            continue;
                        }
                        for _ in 0..n {
                            let position = rand_ang_in_pixel(pix, pixel, &mut rng)?;
                            let z = match selection.sample_redshift(entry, pixel, &mut rng)? {
                                RedshiftDraw::Sampled(z) => z,
                                RedshiftDraw::Masked(_) => continue,
                            };
                            let lensed = lens.map(|maps| {
                                let kappa = maps.kappa[pixel];
                                let gamma = maps.gamma(pixel);
                                GalaxyLensing {
                                    kappa,
                                    gamma,
                                    ellipticity: ellipticity(
                                        &mut rng,
                                        options.ellipticity_sigma,
                                        kappa,
                                        gamma,
                                        options.shear_mode,
                                    ),
                                }
                            });
                            out.push(CatalogRow {
                                entry,
                                field,
                                redshift_bin,
                                pixel,
                                position,
                                z,
                                lensing: lensed,
                            });
                        }
                    }
                    Ok((out, skipped))
                })
                .collect()
        });
        let before = rows.len();
        let mut skipped = 0;
        for (chunk, s) in chunks? {
            rows.extend(chunk);
            skipped += s;
        }
        if skipped > 0 {
            warning::warn(format_args!(
                "{label}: skipped {skipped} galaxies counted on masked pixels"
            ));
        }
        tracing::info!(
            entry = %label,
            galaxies = rows.len() - before,
            skipped,
            lensed = lens.is_some(),
            "catalog drawn"
        );
    }
    Ok(rows)
}
