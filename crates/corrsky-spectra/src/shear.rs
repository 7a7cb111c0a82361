//! Convergence to shear E-mode coefficients.

use corrsky_core::ConfigError;

use crate::alm::Alm;

/// `sqrt((l+2)(l-1) / (l(l+1)))` for `l >= 2`, zero below.
pub fn shear_e_factor(l: u32) -> f64 {
    if l < 2 {
        return 0.0;
    }
    let l = l as f64;
    ((l + 2.0) * (l - 1.0) / (l * (l + 1.0))).sqrt()
}

/// Shear E-mode coefficients from convergence coefficients.
///
/// The B-mode of a pure-lensing shear field vanishes.
pub fn convergence_to_shear_e(kappa: &Alm) -> Alm {
    let mut e = Alm::zeros(kappa.lmax());
    for l in 2..=kappa.lmax() {
        let factor = shear_e_factor(l);
        if let (Some(src), Some(dst)) = (kappa.row(l), e.row_mut(l)) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = *s * factor;
            }
        }
    }
    e
}

/// As [`convergence_to_shear_e`], writing into an existing buffer.
///
/// # Errors
///
/// Returns `Err` if the two coefficient sets have different `lmax`.
pub fn convergence_to_shear_e_into(kappa: &Alm, e: &mut Alm) -> Result<(), ConfigError> {
    if kappa.lmax() != e.lmax() {
        return Err(ConfigError::LengthMismatch {
            what: "shear E-mode lmax",
            expected: kappa.lmax() as usize,
            actual: e.lmax() as usize,
        });
    }
    *e = convergence_to_shear_e(kappa);
    Ok(())
}
