//! corrsky: correlated log-normal sky simulation.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! corrsky sub-crates. For most users, adding `corrsky` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use corrsky::prelude::*;
//!
//! // Two field types in one redshift bin.
//! let index = FieldIndex::builder()
//!     .entry(1, 1)
//!     .entry(2, 1)
//!     .z_range(1, 0.0, 0.5)
//!     .build()
//!     .unwrap();
//!
//! // Target spectra, with a cross spectrum between the two entries.
//! let lmax = 32;
//! let cl = |amp: f64| -> Vec<f64> { (0..=lmax).map(|l| amp / (1.0 + l as f64)).collect() };
//! let mut set = SpectrumSet::new(index.entry_count());
//! set.insert(EntryIndex(0), EntryIndex(0), cl(1.0)).unwrap();
//! set.insert(EntryIndex(1), EntryIndex(1), cl(2.0)).unwrap();
//! set.insert(EntryIndex(0), EntryIndex(1), cl(0.5)).unwrap();
//!
//! let lrange = LRange::new(2, lmax as u32);
//! let pool = WorkerConfig::fixed(2).build_pool().unwrap();
//! let alms = CoefficientGenerator::new(&set, lrange)
//!     .unwrap()
//!     .generate(42, &pool);
//! let alms: Vec<Option<Alm>> = alms.into_iter().map(Some).collect();
//!
//! let recovered = estimate_all(&alms, lrange, None, &pool).unwrap();
//! assert_eq!(recovered.pair_count(), 3);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `corrsky-core` | Field registry, IDs, run configuration, warnings |
//! | [`spectra`] | `corrsky-spectra` | Spectrum transforms, correlated generation, estimation |
//! | [`select`] | `corrsky-select` | Selection functions, galaxy sampling, catalogs |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Field registry, identifiers and configuration (`corrsky-core`).
///
/// [`types::FieldIndex`] maps dense entry indices to (field, redshift-bin)
/// pairs; [`types::SimConfig`] holds the validated run settings.
pub use corrsky_core as types;

/// Spectra and harmonic coefficients (`corrsky-spectra`).
///
/// Power spectrum <-> correlation function transforms
/// ([`spectra::SpectrumTransform`]), correlated coefficient generation
/// ([`spectra::CoefficientGenerator`]) and spectrum recovery
/// ([`spectra::estimate_all`]).
pub use corrsky_spectra as spectra;

/// Selection, sampling and catalogs (`corrsky-select`).
///
/// Build a [`select::SelectionFunction`], turn density maps into counts
/// with [`select::sample_galaxies`] and draw galaxies with
/// [`select::draw_catalog`].
pub use corrsky_select as select;

/// Common imports for typical corrsky usage.
///
/// ```rust
/// use corrsky::prelude::*;
/// ```
pub mod prelude {
    // Registry and configuration
    pub use corrsky_core::{
        EntryIndex, FieldIndex, FieldKind, FieldName, LRange, RedshiftName, SimConfig,
        WorkerConfig, ZRange,
    };

    // Errors
    pub use corrsky_core::{ConfigError, IndexError};
    pub use corrsky_select::{SamplingError, SelectionError, SplineError};
    pub use corrsky_spectra::{CholeskyError, EstimateError, GenerateError};

    // Spectra
    pub use corrsky_spectra::{
        convergence_to_shear_e, estimate_all, recover_alms, Alm, CoefficientGenerator, Complex64,
        HarmonicTransform, RecoveredSpectra, RingWeights, SpectrumSet, SpectrumTransform,
    };

    // Selection and catalogs
    pub use corrsky_select::{
        draw_catalog, sample_galaxies, CatalogOptions, CatalogRow, GalaxyCountStrategy,
        MapStats, Pixelization, RadialCurve, SamplingOptions, SelectionFunction, ShearMode,
    };
}
