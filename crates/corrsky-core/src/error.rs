//! Error types for the corrsky core.
//!
//! Index errors signal caller bugs (an index outside the registry), while
//! configuration errors signal contradictory run settings. Both are fatal
//! to the run: they are reported once and never retried.

use std::error::Error;
use std::fmt;

use crate::id::{EntryIndex, FieldName, RedshiftName};

/// Errors from [`FieldIndex`](crate::FieldIndex) construction and queries.
#[derive(Clone, Debug, PartialEq)]
pub enum IndexError {
    /// The field-name and redshift-name arrays differ in length.
    LengthMismatch {
        /// Number of field names supplied.
        fields: usize,
        /// Number of redshift names supplied.
        redshifts: usize,
    },
    /// The same (field, redshift) pair appears twice in the input.
    DuplicateEntry {
        /// Field name of the repeated pair.
        field: FieldName,
        /// Redshift name of the repeated pair.
        redshift: RedshiftName,
    },
    /// A field-type position is outside `[0, field_type_count)`.
    FieldTypeOutOfRange {
        /// The offending position.
        index: usize,
        /// Number of distinct field types.
        count: usize,
    },
    /// A redshift-bin position is outside `[0, redshift_bin_count)`.
    RedshiftBinOutOfRange {
        /// The offending position.
        index: usize,
        /// Number of distinct redshift bins.
        count: usize,
    },
    /// A sub-index is outside the list of a field type or redshift bin.
    SubIndexOutOfRange {
        /// The offending sub-index.
        sub: usize,
        /// Length of the list being indexed.
        count: usize,
    },
    /// An entry index is outside `[0, entry_count)`.
    EntryOutOfRange {
        /// The offending entry.
        entry: EntryIndex,
        /// Number of registered entries.
        count: usize,
    },
    /// A kind or range declaration names a field or bin that has no entry.
    UnknownName {
        /// Description of the unmatched name.
        name: String,
    },
    /// A redshift range has `z_min >= z_max` or a non-finite bound.
    InvalidRedshiftRange {
        /// The bin the range was declared for.
        redshift: RedshiftName,
        /// Lower bound.
        z_min: f64,
        /// Upper bound.
        z_max: f64,
    },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { fields, redshifts } => write!(
                f,
                "got {fields} field names but {redshifts} redshift names"
            ),
            Self::DuplicateEntry { field, redshift } => {
                write!(f, "entry f{field}z{redshift} registered twice")
            }
            Self::FieldTypeOutOfRange { index, count } => {
                write!(f, "field type {index} out of range (have {count})")
            }
            Self::RedshiftBinOutOfRange { index, count } => {
                write!(f, "redshift bin {index} out of range (have {count})")
            }
            Self::SubIndexOutOfRange { sub, count } => {
                write!(f, "sub-index {sub} out of range (have {count})")
            }
            Self::EntryOutOfRange { entry, count } => {
                write!(f, "entry {entry} out of range (have {count})")
            }
            Self::UnknownName { name } => write!(f, "unknown name: {name}"),
            Self::InvalidRedshiftRange {
                redshift,
                z_min,
                z_max,
            } => write!(
                f,
                "redshift bin {redshift} has invalid range [{z_min}, {z_max})"
            ),
        }
    }
}

impl Error for IndexError {}

/// Errors detected during [`SimConfig::validate()`](crate::SimConfig::validate)
/// and by operations that take multipole ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A multipole range has `lmin > lmax`.
    RangeOrder {
        /// Name of the range setting (`lrange`, `lrange_out`).
        name: &'static str,
        /// Lower bound.
        lmin: u32,
        /// Upper bound.
        lmax: u32,
    },
    /// The output range is not contained in the base range.
    OutputOutsideBase {
        /// Output range as `(lmin, lmax)`.
        output: (u32, u32),
        /// Base range as `(lmin, lmax)`.
        base: (u32, u32),
    },
    /// The azimuthal cutoff exceeds the lower bound of the output range.
    MmaxAboveOutputMin {
        /// The configured cutoff.
        mmax: u32,
        /// Lower bound of the output range.
        lmin_out: u32,
    },
    /// The pixelization has zero pixels.
    NoPixels,
    /// Two arrays that must agree in length do not.
    LengthMismatch {
        /// What was being compared.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// A requested multipole exceeds what the coefficient tables hold.
    LmaxExceeded {
        /// Requested multipole.
        requested: u32,
        /// Largest multipole available.
        available: u32,
    },
    /// The worker pool could not be created.
    ThreadPool {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RangeOrder { name, lmin, lmax } => {
                write!(f, "{name} set in the wrong order: {lmin} > {lmax}")
            }
            Self::OutputOutsideBase { output, base } => write!(
                f,
                "output range [{}, {}] lies outside base range [{}, {}]",
                output.0, output.1, base.0, base.1
            ),
            Self::MmaxAboveOutputMin { mmax, lmin_out } => write!(
                f,
                "mmax_out {mmax} exceeds the output range lower bound {lmin_out}"
            ),
            Self::NoPixels => write!(f, "pixelization has zero pixels"),
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what}: expected length {expected}, got {actual}"),
            Self::LmaxExceeded {
                requested,
                available,
            } => write!(
                f,
                "multipole {requested} requested but coefficients stop at {available}"
            ),
            Self::ThreadPool { reason } => write!(f, "worker pool: {reason}"),
        }
    }
}

impl Error for ConfigError {}
