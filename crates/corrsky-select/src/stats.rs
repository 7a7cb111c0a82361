//! One-point statistics of maps.

use rayon::prelude::*;

use corrsky_core::{EntryIndex, FieldIndex, IndexError};

use crate::streams::WorkerStreams;

/// Mean, variance and skewness of a map, over all pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapStats {
    /// Pixel mean.
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    /// Third central moment over `variance^1.5`.
    pub skewness: f64,
}

/// Parameters of a shifted log-normal variable `exp(Y) - shift` with
/// `Y ~ N(mu, sigma²)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LognormalParams {
    /// Mean of the underlying Gaussian.
    pub mu: f64,
    /// Standard deviation of the underlying Gaussian.
    pub sigma: f64,
    /// Shift.
    pub shift: f64,
}

impl MapStats {
    /// Statistics of `map`, reduced over one chunk per thread of `pool`.
    ///
    /// Partial sums are combined in chunk order, so the result depends only
    /// on the map and the pool size. An empty map gives NaN moments.
    pub fn compute(map: &[f64], pool: &rayon::ThreadPool) -> Self {
        let parts = WorkerStreams::new(0, pool.current_num_threads()).chunks(map.len());
        let n = map.len() as f64;

        let sums: Vec<f64> = pool.install(|| {
            parts
                .par_iter()
                .map(|r| map[r.clone()].iter().sum::<f64>())
                .collect()
        });
        let mean = sums.iter().sum::<f64>() / n;

        let central: Vec<(f64, f64)> = pool.install(|| {
            parts
                .par_iter()
                .map(|r| {
                    map[r.clone()].iter().fold((0.0, 0.0), |(s2, s3), &x| {
                        let d = x - mean;
                        (s2 + d * d, s3 + d * d * d)
                    })
                })
                .collect()
        });
        let (s2, s3) = central
            .iter()
            .fold((0.0, 0.0), |(a, b), &(c, d)| (a + c, b + d));
        let variance = s2 / n;
        Self {
            mean,
            variance,
            skewness: s3 / n / variance.powf(1.5),
        }
    }

    /// Standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Shifted log-normal parameters with the same first three moments.
    ///
    /// Returns `None` unless the variance and skewness are positive.
    pub fn lognormal(&self) -> Option<LognormalParams> {
        if !(self.variance > 0.0 && self.skewness > 0.0) {
            return None;
        }
        // skewness = (y² + 3) y with y² = exp(sigma²) - 1.
        let s = self.skewness;
        let root = (s * s / 4.0 + 1.0).sqrt();
        let y = (s / 2.0 + root).cbrt() + (s / 2.0 - root).cbrt();
        let sigma2 = (1.0 + y * y).ln();
        let shift = self.std_dev() / y - self.mean;
        Some(LognormalParams {
            mu: (self.mean + shift).ln() - sigma2 / 2.0,
            sigma: sigma2.sqrt(),
            shift,
        })
    }
}

/// Statistics of every present map, labelled `f{field}z{redshift}`.
pub fn stats_table(
    maps: &[Option<Vec<f64>>],
    index: &FieldIndex,
    pool: &rayon::ThreadPool,
) -> Result<Vec<(String, MapStats)>, IndexError> {
    let mut rows = Vec::new();
    for (i, map) in maps.iter().enumerate() {
        let Some(map) = map else { continue };
        let label = index.label(EntryIndex(i as u32))?;
        let stats = MapStats::compute(map, pool);
        tracing::debug!(
            entry = %label,
            mean = stats.mean,
            std_dev = stats.std_dev(),
            skewness = stats.skewness,
            "map statistics"
        );
        rows.push((label, stats));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corrsky_core::WorkerConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, LogNormal};

    #[test]
    fn simple_moments() {
        let pool = WorkerConfig::fixed(3).build_pool().unwrap();
        let s = MapStats::compute(&[1.0, 2.0, 3.0, 4.0, 10.0], &pool);
        assert!((s.mean - 4.0).abs() < 1e-12);
        assert!((s.variance - 10.0).abs() < 1e-12);
        // Third central moment: (-27 - 8 - 1 + 0 + 216) / 5 = 36.
        assert!((s.skewness - 36.0 / 10f64.powf(1.5)).abs() < 1e-12);
    }

    #[test]
    fn worker_count_does_not_change_moments() {
        let map: Vec<f64> = (0..1000).map(|i| ((i * 37) % 101) as f64 / 7.0).collect();
        let a = MapStats::compute(&map, &WorkerConfig::fixed(1).build_pool().unwrap());
        let b = MapStats::compute(&map, &WorkerConfig::fixed(4).build_pool().unwrap());
        assert!((a.mean - b.mean).abs() < 1e-12);
        assert!((a.variance - b.variance).abs() < 1e-10);
        assert!((a.skewness - b.skewness).abs() < 1e-10);
    }

    #[test]
    fn lognormal_parameters_recovered() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let d = LogNormal::new(-0.1, 0.4).unwrap();
        let map: Vec<f64> = (0..200_000).map(|_| d.sample(&mut rng) - 0.7).collect();
        let pool = WorkerConfig::fixed(2).build_pool().unwrap();
        let p = MapStats::compute(&map, &pool).lognormal().unwrap();
        assert!((p.sigma - 0.4).abs() < 0.03, "{p:?}");
        assert!((p.shift - 0.7).abs() < 0.1, "{p:?}");
    }

    #[test]
    fn gaussian_map_has_no_lognormal_fit() {
        let s = MapStats {
            mean: 0.0,
            variance: 1.0,
            skewness: -0.1,
        };
        assert_eq!(s.lognormal(), None);
    }

    #[test]
    fn table_skips_absent_maps() {
        let index = FieldIndex::builder().entry(1, 1).entry(1, 2).build().unwrap();
        let pool = WorkerConfig::fixed(1).build_pool().unwrap();
        let rows = stats_table(&[None, Some(vec![1.0, 3.0])], &index, &pool).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "f1z2");
        assert_eq!(rows[0].1.mean, 2.0);
    }
}
