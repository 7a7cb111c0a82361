//! Galaxy image ellipticities from convergence and shear.

use corrsky_spectra::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;

/// Largest intrinsic ellipticity drawn when raw shear is applied.
pub const MAX_INTRINSIC_WITH_SHEAR: f64 = 0.9;

/// Which lensing distortion is applied to the intrinsic ellipticity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShearMode {
    /// Add the shear `γ` directly (weak-lensing limit).
    Shear,
    /// Apply the reduced shear `g = γ / (1 - κ)`.
    #[default]
    ReducedShear,
}

/// Draw an intrinsic ellipticity with per-component standard deviation
/// `sigma` and lens it by `(kappa, gamma)`.
///
/// With `|g|² <= 1` the image is `ε_s + γ` in [`ShearMode::Shear`] or
/// `(ε_s + g) / (1 + g* ε_s)` in [`ShearMode::ReducedShear`]. Otherwise
/// it is `(1 + g ε_s*) / (ε_s* + g*)` in either mode. In shear mode the
/// intrinsic ellipticity is redrawn until `|ε_s| <= 0.9`.
pub fn ellipticity<R: Rng + ?Sized>(
    rng: &mut R,
    sigma: f64,
    kappa: f64,
    gamma: Complex64,
    mode: ShearMode,
) -> Complex64 {
    let one = Complex64::new(1.0, 0.0);
    let g = gamma / (one - kappa);

    let source = if sigma > 0.0 {
        let mut draw = || {
            Complex64::new(
                sigma * rng.sample::<f64, _>(StandardNormal),
                sigma * rng.sample::<f64, _>(StandardNormal),
            )
        };
        match mode {
            ShearMode::Shear => loop {
                let e = draw();
                if e.norm() <= MAX_INTRINSIC_WITH_SHEAR {
                    break e;
                }
            },
            ShearMode::ReducedShear => draw(),
        }
    } else {
        Complex64::new(0.0, 0.0)
    };

    if g.norm_sqr() <= 1.0 {
        match mode {
            ShearMode::Shear => source + gamma,
            ShearMode::ReducedShear => (source + g) / (one + g.conj() * source),
        }
    } else {
        (one + g * source.conj()) / (source.conj() + g.conj())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn close(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-12
    }

    #[test]
    fn no_intrinsic_ellipticity() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let gamma = Complex64::new(0.03, -0.02);
        let e = ellipticity(&mut rng, 0.0, 0.0, gamma, ShearMode::Shear);
        assert!(close(e, gamma));
        // Reduced shear with κ = 0.5 doubles γ.
        let e = ellipticity(&mut rng, 0.0, 0.5, gamma, ShearMode::ReducedShear);
        assert!(close(e, gamma * 2.0));
    }

    #[test]
    fn strong_lensing_branch() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // |g| > 1: with ε_s = 0 the image is 1 / g*.
        let gamma = Complex64::new(0.6, 0.8);
        let e = ellipticity(&mut rng, 0.0, 0.5, gamma, ShearMode::ReducedShear);
        let g = gamma * 2.0;
        assert!(close(e, Complex64::new(1.0, 0.0) / g.conj()));
        let e_shear = ellipticity(&mut rng, 0.0, 0.5, gamma, ShearMode::Shear);
        assert!(close(e_shear, e));
    }

    #[test]
    fn intrinsic_scatter() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 20_000;
        let zero = Complex64::new(0.0, 0.0);
        let draws: Vec<Complex64> = (0..n)
            .map(|_| ellipticity(&mut rng, 0.25, 0.0, zero, ShearMode::ReducedShear))
            .collect();
        let var_re = draws.iter().map(|e| e.re * e.re).sum::<f64>() / n as f64;
        assert!((var_re - 0.0625).abs() < 0.004, "{var_re}");
    }

    #[test]
    fn shear_mode_truncates_source() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let zero = Complex64::new(0.0, 0.0);
        for _ in 0..2000 {
            let e = ellipticity(&mut rng, 0.8, 0.0, zero, ShearMode::Shear);
            assert!(e.norm() <= MAX_INTRINSIC_WITH_SHEAR);
        }
    }
}
