//! Core types for the corrsky sky simulator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the corrsky workspace:
//! field and redshift names, the [`FieldIndex`] registry that maps
//! (field, redshift-bin) pairs to dense linear indices, run configuration,
//! error types, and the process-wide warning counter.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod id;
pub mod registry;
pub mod warning;

pub use config::{check_output_range, LRange, SimConfig, WorkerConfig};
pub use error::{ConfigError, IndexError};
pub use id::{EntryIndex, FieldName, RedshiftName};
pub use registry::{FieldIndex, FieldIndexBuilder, FieldKind, FieldRecord, RedshiftBin, ZRange};
