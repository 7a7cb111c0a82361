//! Sampling galaxy counts from density-contrast maps.

use rayon::prelude::*;

use corrsky_core::{ConfigError, EntryIndex, FieldIndex, FieldKind};

use crate::error::{SamplingError, SelectionError};
use crate::selection::SelectionFunction;
use crate::sky::Pixelization;
use crate::strategy::GalaxyCountStrategy;
use crate::streams::{lane, StreamPurpose, WorkerStreams};

/// Value written to masked pixels (the HEALPix `UNSEEN` marker).
pub const UNSEEN: f64 = -1.6375e30;

/// Settings for [`sample_galaxies`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplingOptions {
    /// Count distribution.
    pub strategy: GalaxyCountStrategy,
    /// Raise density contrasts below -1 to -1 before sampling.
    pub clamp_negative_density: bool,
    /// Value written to masked pixels.
    pub sentinel: f64,
    /// Master seed of the count streams.
    pub seed: u64,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            strategy: GalaxyCountStrategy::Poisson,
            clamp_negative_density: false,
            sentinel: UNSEEN,
            seed: 42,
        }
    }
}

/// Per-entry outcome of [`sample_galaxies`].
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingReport {
    /// The sampled entry.
    pub entry: EntryIndex,
    /// Number of pixels in the map.
    pub pixels: usize,
    /// Pixels whose density was clamped, or whose drawn count was
    /// negative when clamping is off.
    pub negative_pixels: usize,
    /// Pixels set to the sentinel.
    pub masked_pixels: usize,
}

impl SamplingReport {
    /// `negative_pixels / pixels`.
    pub fn negative_fraction(&self) -> f64 {
        if self.pixels == 0 {
            0.0
        } else {
            self.negative_pixels as f64 / self.pixels as f64
        }
    }
}

#[derive(Default)]
struct Tally {
    negative: usize,
    masked: usize,
}

/// Replace the density contrast of every galaxy entry by a galaxy count.
///
/// For each pixel of each [`FieldKind::Galaxies`] entry: masked pixels get
/// `options.sentinel`; otherwise the expected count is
/// `s (1 + δ) dΩ` with variance `s dΩ`, where `s` is the selection weight
/// and `dΩ` the pixel area in square arcminutes. Entries of other kinds
/// and absent maps are left as they are.
///
/// Pixels are split into one chunk per worker, each with its own stream,
/// so the counts depend only on `options.seed` and the pool size.
///
/// # Errors
///
/// Returns `Err` if `maps` does not have one slot per entry or a map does
/// not cover the pixelization.
pub fn sample_galaxies<P: Pixelization + ?Sized>(
    maps: &mut [Option<Vec<f64>>],
    index: &FieldIndex,
    selection: &SelectionFunction,
    pix: &P,
    options: &SamplingOptions,
    pool: &rayon::ThreadPool,
) -> Result<Vec<SamplingReport>, SamplingError> {
    let npix = pix.pixel_count();
    check(maps, index, selection, npix)?;
    let dw = pix.pixel_area_arcmin2();
    let streams = WorkerStreams::for_pool(options.seed, pool);

    let mut reports = Vec::new();
    for (e, slot) in maps.iter_mut().enumerate() {
        let entry = EntryIndex(e as u32);
        if index.kind_of(entry).map_err(SelectionError::from)? != FieldKind::Galaxies {
            continue;
        }
        let Some(map) = slot.as_mut() else {
            continue;
        };
        let label = index.label(entry).map_err(SelectionError::from)?;
        let stream_lane = lane(StreamPurpose::Counts, entry);

        let tallies: Vec<Tally> = pool.install(|| {
            streams
                .split_mut(map)
                .into_par_iter()
                .map(|(w, start, part)| {
                    let mut rng = streams.stream(stream_lane, w);
                    let mut tally = Tally::default();
                    for (offset, value) in part.iter_mut().enumerate() {
                        let pixel = start + offset;
                        if options.clamp_negative_density && *value < -1.0 {
                            *value = -1.0;
                            tally.negative += 1;
                        }
                        if !selection.bit_at(e, pixel).is_valid() {
                            *value = options.sentinel;
                            tally.masked += 1;
                            continue;
                        }
                        let s = selection.weight_at(e, pixel);
                        let mean = s * (1.0 + *value) * dw;
                        let variance = s * dw;
                        *value = options.strategy.draw(mean, variance, &mut rng);
                        if !options.clamp_negative_density && *value < 0.0 {
                            tally.negative += 1;
                        }
                    }
                    tally
                })
                .collect()
        });

        let report = SamplingReport {
            entry,
            pixels: npix,
            negative_pixels: tallies.iter().map(|t| t.negative).sum(),
            masked_pixels: tallies.iter().map(|t| t.masked).sum(),
        };
        tracing::info!(
            entry = %label,
            pixels = npix,
            masked = report.masked_pixels,
            negative_fraction = report.negative_fraction(),
            strategy = %options.strategy,
            "galaxies sampled"
        );
        reports.push(report);
    }
    Ok(reports)
}

fn check(
    maps: &[Option<Vec<f64>>],
    index: &FieldIndex,
    selection: &SelectionFunction,
    npix: usize,
) -> Result<(), ConfigError> {
    if npix == 0 {
        return Err(ConfigError::NoPixels);
    }
    let pairs = [
        ("maps per entry", index.entry_count(), maps.len()),
        ("selection entries", index.entry_count(), selection.entry_count()),
        ("selection pixels", npix, selection.pixel_count()),
    ];
    for (what, expected, actual) in pairs {
        if expected != actual {
            return Err(ConfigError::LengthMismatch {
                what,
                expected,
                actual,
            });
        }
    }
    for map in maps.iter().flatten() {
        if map.len() != npix {
            return Err(ConfigError::LengthMismatch {
                what: "map pixels",
                expected: npix,
                actual: map.len(),
            });
        }
    }
    Ok(())
}
