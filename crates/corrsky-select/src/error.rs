//! Error types for selection functions and sampling.

use std::error::Error;
use std::fmt;

use corrsky_core::{ConfigError, EntryIndex, FieldName, IndexError};

/// Errors from building a radial [`Spline`](crate::radial::Spline).
#[derive(Clone, Debug, PartialEq)]
pub enum SplineError {
    /// Abscissa and ordinate arrays differ in length.
    LengthMismatch {
        /// Number of abscissas.
        x: usize,
        /// Number of ordinates.
        y: usize,
    },
    /// Fewer than two points were supplied.
    TooFewPoints {
        /// Number of points.
        count: usize,
    },
    /// Abscissas are not strictly increasing (or not finite).
    NotIncreasing {
        /// Index of the first offending point.
        index: usize,
    },
}

impl fmt::Display for SplineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { x, y } => {
                write!(f, "spline has {x} abscissas but {y} values")
            }
            Self::TooFewPoints { count } => {
                write!(f, "spline needs at least 2 points, got {count}")
            }
            Self::NotIncreasing { index } => {
                write!(f, "spline abscissas not strictly increasing at point {index}")
            }
        }
    }
}

impl Error for SplineError {}

/// Errors from building or querying a
/// [`SelectionFunction`](crate::selection::SelectionFunction).
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionError {
    /// Redshift sampling was requested from a jointly tabulated selection.
    NotSeparable,
    /// The entry's redshift bin has no `[z_min, z_max)` range.
    MissingRedshiftRange {
        /// The entry.
        entry: EntryIndex,
    },
    /// The radial curve is zero over the entry's whole bin.
    ZeroRadialDensity {
        /// The entry.
        entry: EntryIndex,
    },
    /// An entry index is outside the registry.
    EntryOutOfRange {
        /// The offending entry.
        entry: EntryIndex,
        /// Number of entries.
        count: usize,
    },
    /// A pixel index is outside the pixelization.
    PixelOutOfRange {
        /// The offending pixel.
        pixel: usize,
        /// Number of pixels.
        count: usize,
    },
    /// A map or table has the wrong number of values.
    LengthMismatch {
        /// What was being checked.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// A component was declared for a field with no entries.
    UnknownField {
        /// The field name.
        field: FieldName,
    },
    /// Separable components and joint tables were both supplied.
    MixedLayout,
    /// A numeric setting is out of its domain.
    InvalidParameter {
        /// Name of the setting.
        name: &'static str,
        /// Value supplied.
        value: f64,
    },
    /// A registry lookup failed.
    Index(IndexError),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSeparable => write!(
                f,
                "redshift sampling requires a separable selection function"
            ),
            Self::MissingRedshiftRange { entry } => {
                write!(f, "entry {entry} has no redshift range")
            }
            Self::ZeroRadialDensity { entry } => {
                write!(f, "radial selection of entry {entry} vanishes over its bin")
            }
            Self::EntryOutOfRange { entry, count } => {
                write!(f, "entry {entry} out of range (have {count})")
            }
            Self::PixelOutOfRange { pixel, count } => {
                write!(f, "pixel {pixel} out of range (have {count})")
            }
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what}: expected {expected} values, got {actual}"),
            Self::UnknownField { field } => write!(f, "no entry has field {field}"),
            Self::MixedLayout => write!(
                f,
                "selection has both separable components and joint tables"
            ),
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid {name}: {value}")
            }
            Self::Index(e) => write!(f, "{e}"),
        }
    }
}

impl Error for SelectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Index(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IndexError> for SelectionError {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}

/// Errors from galaxy count sampling and catalog drawing.
#[derive(Clone, Debug, PartialEq)]
pub enum SamplingError {
    /// Selection query failed.
    Selection(SelectionError),
    /// Inputs are inconsistent with each other.
    Config(ConfigError),
    /// No position inside the pixel was found.
    PixelRejection {
        /// The pixel.
        pixel: usize,
        /// Attempts made.
        attempts: usize,
    },
}

impl fmt::Display for SamplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selection(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::PixelRejection { pixel, attempts } => write!(
                f,
                "no position found inside pixel {pixel} after {attempts} attempts"
            ),
        }
    }
}

impl Error for SamplingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Selection(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::PixelRejection { .. } => None,
        }
    }
}

impl From<SelectionError> for SamplingError {
    fn from(e: SelectionError) -> Self {
        Self::Selection(e)
    }
}

impl From<ConfigError> for SamplingError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
