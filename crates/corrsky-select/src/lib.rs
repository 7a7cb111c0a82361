//! Selection functions, galaxy sampling and catalog drawing.
//!
//! - [`selection`]: mask bits, expected-count weights and redshift draws.
//! - [`radial`]: spline-interpolated radial selection curves.
//! - [`galaxies`]: density maps to galaxy counts.
//! - [`catalog`]: galaxy positions, redshifts and ellipticities.
//! - [`sky`]: the pixelization seam and angle helpers.
//! - [`stats`]: one-point map statistics.
//!
//! Every parallel loop splits its work statically into one chunk per
//! worker with its own random stream (see [`streams`]), so outputs are
//! fixed by the seed and the worker count.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod ellipticity;
pub mod error;
pub mod galaxies;
pub mod maximize;
pub mod radial;
pub mod selection;
pub mod sky;
pub mod stats;
pub mod strategy;
pub mod streams;

pub use catalog::{draw_catalog, galaxy_count, CatalogOptions, CatalogRow, GalaxyLensing, LensingMaps};
pub use ellipticity::{ellipticity, ShearMode};
pub use error::{SamplingError, SelectionError, SplineError};
pub use galaxies::{sample_galaxies, SamplingOptions, SamplingReport, UNSEEN};
pub use radial::{RadialCurve, Spline};
pub use selection::{MaskBit, RedshiftDraw, SelectionBuilder, SelectionFunction};
pub use sky::{AngularUnits, BandPixelization, PixelBounds, Pixelization, Pointing};
pub use stats::{stats_table, LognormalParams, MapStats};
pub use strategy::GalaxyCountStrategy;
pub use streams::WorkerStreams;
