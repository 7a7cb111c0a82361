//! Process-wide warning counter.
//!
//! Recoverable conditions (lookup misses, missing auxiliary tables) are
//! logged through `tracing` and counted here so a run can report the total
//! in its final summary.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static WARNING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Log a warning and increment the process-wide counter.
pub fn warn(message: impl fmt::Display) {
    WARNING_COUNTER.fetch_add(1, Ordering::Relaxed);
    tracing::warn!("{message}");
}

/// Number of warnings recorded so far in this process.
pub fn warning_count() -> u64 {
    WARNING_COUNTER.load(Ordering::Relaxed)
}

/// Emit the end-of-run summary line.
pub fn log_summary() {
    tracing::info!(warnings = warning_count(), "total number of warnings");
}
