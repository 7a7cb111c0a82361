//! Spectra, correlation functions and correlated harmonic coefficients.
//!
//! - [`transform`]: angular power spectrum <-> correlation function.
//! - [`correlate`]: target spectra, per-multipole Cholesky factors, and
//!   reproducible parallel generation of correlated coefficients.
//! - [`estimate`]: recovery of auto and cross spectra.
//! - [`shear`]: convergence to shear E-mode coefficients.
//! - [`harmonic`]: the seam to an external map-analysis library.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alm;
pub mod cholesky;
pub mod correlate;
pub mod dct;
pub mod error;
pub mod estimate;
pub mod harmonic;
pub mod shear;
pub mod transform;

pub use alm::Alm;
pub use cholesky::CholeskyFactor;
pub use correlate::{correlate, CoefficientGenerator, SpectrumSet};
pub use error::{CholeskyError, EstimateError, GenerateError};
pub use estimate::{estimate_all, estimate_pair, pair_count, pair_index, pair_of, RecoveredSpectra};
pub use harmonic::{recover_alms, HarmonicTransform, RingWeights};
pub use shear::convergence_to_shear_e;
pub use transform::{correlation_to_spectrum, spectrum_to_correlation, SpectrumTransform};

pub use rustfft::num_complex::Complex64;
