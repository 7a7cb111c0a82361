//! Run configuration and validation.
//!
//! [`SimConfig`] gathers the scalar settings every stage of a run reads:
//! multipole ranges, the azimuthal cutoff for spectrum recovery, the
//! pixelization size, the master seed, and the worker pool size.
//! [`validate()`](SimConfig::validate) checks them once at startup.

use std::ops::RangeInclusive;

use crate::error::ConfigError;

// ── LRange ─────────────────────────────────────────────────────────

/// Inclusive multipole range `[lmin, lmax]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LRange {
    /// Smallest multipole.
    pub lmin: u32,
    /// Largest multipole.
    pub lmax: u32,
}

impl LRange {
    /// Create a range. Ordering is checked by [`LRange::check_order`].
    pub fn new(lmin: u32, lmax: u32) -> Self {
        Self { lmin, lmax }
    }

    /// Number of multipoles in the range (zero if inverted).
    pub fn len(&self) -> usize {
        if self.lmin > self.lmax {
            0
        } else {
            (self.lmax - self.lmin + 1) as usize
        }
    }

    /// Returns `true` if the range holds no multipole.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `l` lies in the range.
    pub fn contains(&self, l: u32) -> bool {
        l >= self.lmin && l <= self.lmax
    }

    /// Whether `other` lies entirely inside this range.
    pub fn covers(&self, other: &LRange) -> bool {
        other.lmin >= self.lmin && other.lmax <= self.lmax
    }

    /// Iterate over the multipoles.
    pub fn iter(&self) -> RangeInclusive<u32> {
        self.lmin..=self.lmax
    }

    /// Reject `lmin > lmax`, naming the setting in the error.
    pub fn check_order(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.lmin > self.lmax {
            return Err(ConfigError::RangeOrder {
                name,
                lmin: self.lmin,
                lmax: self.lmax,
            });
        }
        Ok(())
    }
}

// ── WorkerConfig ───────────────────────────────────────────────────

/// Size of the data-parallel worker pool.
///
/// The worker count also fixes the static partition of random draws, so
/// results are reproducible for a given seed and worker count.
#[derive(Clone, Debug, Default)]
pub struct WorkerConfig {
    /// Number of workers. `None` = auto-detect (`available_parallelism`,
    /// clamped to `[1, 64]`).
    pub worker_count: Option<usize>,
}

impl WorkerConfig {
    /// A pool of exactly `n` workers (clamped to `[1, 64]`).
    pub fn fixed(n: usize) -> Self {
        Self {
            worker_count: Some(n),
        }
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, 64),
        }
    }

    /// Build a rayon pool with the resolved number of threads.
    pub fn build_pool(&self) -> Result<rayon::ThreadPool, ConfigError> {
        let workers = self.resolved_worker_count();
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("corrsky-worker-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool {
                reason: e.to_string(),
            })
    }
}

// ── SimConfig ──────────────────────────────────────────────────────

/// Scalar settings of a simulation run.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Multipoles simulated. Default: `[1, 512]`.
    pub lrange: LRange,
    /// Multipoles written to diagnostic outputs. Default: `[2, 512]`.
    pub lrange_out: LRange,
    /// Azimuthal cutoff for spectrum recovery; `None` sums over all `m`.
    pub mmax_out: Option<u32>,
    /// Number of sky pixels. Default: 12 * 256² (HEALPix Nside = 256).
    pub pixel_count: usize,
    /// Master seed for every random stream. Default: 42.
    pub seed: u64,
    /// Worker pool size.
    pub workers: WorkerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            lrange: LRange::new(1, 512),
            lrange_out: LRange::new(2, 512),
            mmax_out: None,
            pixel_count: 12 * 256 * 256,
            seed: 42,
            workers: WorkerConfig::default(),
        }
    }
}

impl SimConfig {
    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - either range is inverted
    /// - `lrange_out` is not inside `lrange`
    /// - `mmax_out` exceeds `lrange_out.lmin`
    /// - `pixel_count` is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lrange.check_order("lrange")?;
        self.lrange_out.check_order("lrange_out")?;
        check_output_range(&self.lrange, &self.lrange_out, self.mmax_out)?;
        if self.pixel_count == 0 {
            return Err(ConfigError::NoPixels);
        }
        Ok(())
    }
}

/// Check that `output` lies inside `base` and that `mmax` does not exceed
/// the lower bound of `output`.
///
/// The cutoff rule keeps every recovered multipole summed over the same
/// number of azimuthal modes.
pub fn check_output_range(
    base: &LRange,
    output: &LRange,
    mmax: Option<u32>,
) -> Result<(), ConfigError> {
    if !base.covers(output) {
        return Err(ConfigError::OutputOutsideBase {
            output: (output.lmin, output.lmax),
            base: (base.lmin, base.lmax),
        });
    }
    if let Some(mmax) = mmax {
        if mmax > output.lmin {
            return Err(ConfigError::MmaxAboveOutputMin {
                mmax,
                lmin_out: output.lmin,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_ranges() {
        let cfg = SimConfig {
            lrange: LRange::new(10, 2),
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::RangeOrder {
                name: "lrange",
                lmin: 10,
                lmax: 2
            })
        );

        let cfg = SimConfig {
            lrange_out: LRange::new(9, 3),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RangeOrder { name: "lrange_out", .. })
        ));
    }

    #[test]
    fn rejects_output_outside_base() {
        let cfg = SimConfig {
            lrange: LRange::new(2, 100),
            lrange_out: LRange::new(2, 200),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutputOutsideBase { .. })
        ));

        let cfg = SimConfig {
            lrange: LRange::new(5, 100),
            lrange_out: LRange::new(2, 100),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutputOutsideBase { .. })
        ));
    }

    #[test]
    fn rejects_mmax_above_output_min() {
        let cfg = SimConfig {
            lrange_out: LRange::new(4, 100),
            mmax_out: Some(5),
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MmaxAboveOutputMin {
                mmax: 5,
                lmin_out: 4
            })
        );

        let ok = SimConfig {
            lrange_out: LRange::new(4, 100),
            mmax_out: Some(4),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn rejects_zero_pixels() {
        let cfg = SimConfig {
            pixel_count: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoPixels));
    }

    #[test]
    fn lrange_helpers() {
        let r = LRange::new(2, 5);
        assert_eq!(r.len(), 4);
        assert!(r.contains(2) && r.contains(5) && !r.contains(6));
        assert!(r.covers(&LRange::new(3, 4)));
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
        assert!(LRange::new(3, 2).is_empty());
    }

    #[test]
    fn worker_count_clamped() {
        assert_eq!(WorkerConfig::fixed(0).resolved_worker_count(), 1);
        assert_eq!(WorkerConfig::fixed(1000).resolved_worker_count(), 64);
        assert!(WorkerConfig::default().resolved_worker_count() >= 1);
    }

    #[test]
    fn pool_has_requested_threads() {
        let pool = WorkerConfig::fixed(3).build_pool().unwrap();
        assert_eq!(pool.current_num_threads(), 3);
    }
}
