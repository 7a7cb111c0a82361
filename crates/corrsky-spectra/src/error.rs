//! Error types for spectra, factorization, generation and estimation.

use std::error::Error;
use std::fmt;

use corrsky_core::{ConfigError, EntryIndex};

/// Errors from [`CholeskyFactor`](crate::CholeskyFactor) construction.
#[derive(Clone, Debug, PartialEq)]
pub enum CholeskyError {
    /// The matrix storage is not `n×n`.
    LengthMismatch {
        /// `n²`.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },
    /// A pivot was zero, negative or NaN.
    NotPositiveDefinite {
        /// Row at which factorization failed.
        row: usize,
        /// Offending pivot value.
        pivot: f64,
    },
}

impl fmt::Display for CholeskyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, actual } => {
                write!(f, "matrix has {actual} entries, expected {expected}")
            }
            Self::NotPositiveDefinite { row, pivot } => write!(
                f,
                "matrix not positive definite: pivot {pivot} at row {row}"
            ),
        }
    }
}

impl Error for CholeskyError {}

/// Errors from building spectrum sets and generating correlated coefficients.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerateError {
    /// Vector length does not match the number of entries.
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// An entry index is outside the spectrum set.
    EntryOutOfRange {
        /// The offending entry.
        entry: EntryIndex,
        /// Number of entries.
        count: usize,
    },
    /// The covariance at one multipole could not be factored.
    Cholesky {
        /// Multipole.
        l: u32,
        /// Underlying failure.
        source: CholeskyError,
    },
    /// A factor list does not cover the multipole range.
    FactorCount {
        /// Factors needed.
        expected: usize,
        /// Factors supplied.
        actual: usize,
    },
    /// Invalid range settings.
    Config(ConfigError),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, actual } => {
                write!(f, "got {actual} values for {expected} entries")
            }
            Self::EntryOutOfRange { entry, count } => {
                write!(f, "entry {entry} out of range (have {count})")
            }
            Self::Cholesky { l, source } => write!(f, "covariance at l={l}: {source}"),
            Self::FactorCount { expected, actual } => {
                write!(f, "got {actual} factors for {expected} multipoles")
            }
            Self::Config(e) => write!(f, "{e}"),
        }
    }
}

impl Error for GenerateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cholesky { source, .. } => Some(source),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for GenerateError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Errors from power spectrum recovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EstimateError {
    /// Output range or azimuthal cutoff is invalid.
    Config(ConfigError),
    /// An entry's coefficients stop below the output range.
    AlmTooShort {
        /// Entry position in the input.
        entry: usize,
        /// Largest multipole stored for the entry.
        lmax: u32,
        /// Largest multipole requested.
        requested: u32,
    },
}

impl fmt::Display for EstimateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::AlmTooShort {
                entry,
                lmax,
                requested,
            } => write!(
                f,
                "entry {entry} has coefficients up to l={lmax}, l={requested} requested"
            ),
        }
    }
}

impl Error for EstimateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::AlmTooShort { .. } => None,
        }
    }
}

impl From<ConfigError> for EstimateError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
