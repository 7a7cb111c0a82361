//! Galaxy count distributions.

use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};

/// How the number of galaxies in a pixel is drawn from its expectation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GalaxyCountStrategy {
    /// Poisson with the expected count as mean.
    #[default]
    Poisson,
    /// The expected count itself, no noise.
    Fixed,
    /// Normal with the expected count as mean and the shot-noise variance.
    Gaussian,
}

impl GalaxyCountStrategy {
    /// Draw a count with the given `mean` and `variance`.
    ///
    /// Poisson ignores `variance` and returns 0 for a non-positive or
    /// non-finite mean. Gaussian with non-positive variance returns the mean.
    pub fn draw<R: Rng + ?Sized>(self, mean: f64, variance: f64, rng: &mut R) -> f64 {
        match self {
            Self::Fixed => mean,
            Self::Poisson => {
                if !(mean.is_finite() && mean > 0.0) {
                    return 0.0;
                }
                match Poisson::new(mean) {
                    Ok(d) => d.sample(rng),
                    Err(_) => mean,
                }
            }
            Self::Gaussian => {
                if !(variance.is_finite() && variance > 0.0) {
                    return mean;
                }
                match Normal::new(mean, variance.sqrt()) {
                    Ok(d) => d.sample(rng),
                    Err(_) => mean,
                }
            }
        }
    }
}

impl fmt::Display for GalaxyCountStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poisson => write!(f, "poisson"),
            Self::Fixed => write!(f, "fixed"),
            Self::Gaussian => write!(f, "gaussian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn moments(strategy: GalaxyCountStrategy, mean: f64, var: f64) -> (f64, f64) {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let n = 20_000;
        let xs: Vec<f64> = (0..n).map(|_| strategy.draw(mean, var, &mut rng)).collect();
        let m = xs.iter().sum::<f64>() / n as f64;
        let v = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (n - 1) as f64;
        (m, v)
    }

    #[test]
    fn poisson_moments() {
        let (m, v) = moments(GalaxyCountStrategy::Poisson, 4.0, 999.0);
        assert!((m - 4.0).abs() < 0.1, "{m}");
        assert!((v - 4.0).abs() < 0.3, "{v}");
    }

    #[test]
    fn poisson_counts_are_integers() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let k = GalaxyCountStrategy::Poisson.draw(2.5, 2.5, &mut rng);
            assert_eq!(k, k.round());
            assert!(k >= 0.0);
        }
    }

    #[test]
    fn poisson_non_positive_mean_is_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(GalaxyCountStrategy::Poisson.draw(0.0, 1.0, &mut rng), 0.0);
        assert_eq!(GalaxyCountStrategy::Poisson.draw(-3.0, 1.0, &mut rng), 0.0);
        assert_eq!(GalaxyCountStrategy::Poisson.draw(f64::NAN, 1.0, &mut rng), 0.0);
    }

    #[test]
    fn gaussian_moments() {
        let (m, v) = moments(GalaxyCountStrategy::Gaussian, 10.0, 9.0);
        assert!((m - 10.0).abs() < 0.1, "{m}");
        assert!((v - 9.0).abs() < 0.5, "{v}");
    }

    #[test]
    fn gaussian_without_variance_and_fixed() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(GalaxyCountStrategy::Gaussian.draw(-2.0, 0.0, &mut rng), -2.0);
        assert_eq!(GalaxyCountStrategy::Fixed.draw(7.25, 3.0, &mut rng), 7.25);
        assert_eq!(GalaxyCountStrategy::default().to_string(), "poisson");
    }
}
