//! Sky geometry: the pixelization seam and angle helpers.
//!
//! Angles follow the physics convention: colatitude `theta` in `[0, π]`
//! measured from the north pole and longitude `phi` in `[0, 2π)`.

use std::f64::consts::{FRAC_PI_2, TAU};

use rand::Rng;

use crate::error::SamplingError;

/// Area of the full sky in square arcminutes (4π sr).
pub const FULL_SKY_ARCMIN2: f64 = 1.4851066049791e8;

/// Attempts before [`rand_ang_in_pixel`] gives up on a pixel.
pub const MAX_PIXEL_ATTEMPTS: usize = 100_000;

/// A direction on the sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointing {
    /// Colatitude in radians.
    pub theta: f64,
    /// Longitude in radians.
    pub phi: f64,
}

impl Pointing {
    /// Create a pointing.
    pub fn new(theta: f64, phi: f64) -> Self {
        Self { theta, phi }
    }
}

/// Angular bounding box of a pixel.
///
/// `phi_min` may be negative for pixels straddling `phi = 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelBounds {
    /// Northern edge (smallest colatitude).
    pub theta_min: f64,
    /// Southern edge.
    pub theta_max: f64,
    /// Western edge.
    pub phi_min: f64,
    /// Eastern edge.
    pub phi_max: f64,
}

/// Pixel <-> angle queries of an equal-area pixelization.
pub trait Pixelization: Sync {
    /// Number of pixels covering the sphere.
    fn pixel_count(&self) -> usize;

    /// Angular bounding box of `pixel`.
    fn pixel_bounds(&self, pixel: usize) -> PixelBounds;

    /// Pixel containing `ang`.
    fn ang_to_pixel(&self, ang: Pointing) -> usize;

    /// Area of one pixel in square arcminutes.
    fn pixel_area_arcmin2(&self) -> f64 {
        FULL_SKY_ARCMIN2 / self.pixel_count() as f64
    }
}

/// Equal-area latitude bands split into equal longitude cells.
///
/// Band `i` of `n_theta` spans `cos(theta)` in
/// `[1 - 2(i+1)/n_theta, 1 - 2i/n_theta]`; pixel `i * n_phi + j` is cell
/// `j` of band `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandPixelization {
    n_theta: usize,
    n_phi: usize,
}

impl BandPixelization {
    /// Create a grid of `n_theta` bands by `n_phi` cells (both at least 1).
    pub fn new(n_theta: usize, n_phi: usize) -> Self {
        Self {
            n_theta: n_theta.max(1),
            n_phi: n_phi.max(1),
        }
    }

    /// Number of latitude bands.
    pub fn bands(&self) -> usize {
        self.n_theta
    }

    /// Cells per band.
    pub fn cells_per_band(&self) -> usize {
        self.n_phi
    }
}

impl Pixelization for BandPixelization {
    fn pixel_count(&self) -> usize {
        self.n_theta * self.n_phi
    }

    fn pixel_bounds(&self, pixel: usize) -> PixelBounds {
        let band = (pixel / self.n_phi).min(self.n_theta - 1);
        let cell = pixel % self.n_phi;
        let step = 2.0 / self.n_theta as f64;
        let cos_top = 1.0 - step * band as f64;
        let cos_bottom = (1.0 - step * (band + 1) as f64).max(-1.0);
        let dphi = TAU / self.n_phi as f64;
        PixelBounds {
            theta_min: cos_top.clamp(-1.0, 1.0).acos(),
            theta_max: cos_bottom.acos(),
            phi_min: dphi * cell as f64,
            phi_max: dphi * (cell + 1) as f64,
        }
    }

    fn ang_to_pixel(&self, ang: Pointing) -> usize {
        let x = (1.0 - ang.theta.cos()) / 2.0;
        let band = ((x * self.n_theta as f64) as usize).min(self.n_theta - 1);
        let phi = ang.phi.rem_euclid(TAU);
        let cell = ((phi / TAU * self.n_phi as f64) as usize).min(self.n_phi - 1);
        band * self.n_phi + cell
    }
}

/// Radians to degrees.
pub fn rad2deg(rad: f64) -> f64 {
    rad.to_degrees()
}

/// Colatitude (radians) to declination (degrees).
pub fn theta2dec(theta: f64) -> f64 {
    rad2deg(FRAC_PI_2 - theta)
}

/// Longitude (radians) to right ascension (degrees).
pub fn phi2ra(phi: f64) -> f64 {
    rad2deg(phi)
}

/// Direction of a unit vector, with `phi` in `[0, 2π)`.
pub fn xyz2ang(x: f64, y: f64, z: f64) -> Pointing {
    let theta = z.clamp(-1.0, 1.0).acos();
    let phi = y.atan2(x);
    Pointing {
        theta,
        phi: if phi < 0.0 { phi + TAU } else { phi },
    }
}

/// Uniform direction inside a colatitude/longitude box.
///
/// Uniform in `cos(theta)` so the density is uniform on the sphere.
pub fn randang<R: Rng>(rng: &mut R, bounds: &PixelBounds) -> Pointing {
    let xmin = (1.0 + bounds.theta_max.cos()) / 2.0;
    let xmax = (1.0 + bounds.theta_min.cos()) / 2.0;
    let u: f64 = rng.random();
    let v: f64 = rng.random();
    let phi = u * (bounds.phi_max - bounds.phi_min) + bounds.phi_min;
    let theta = (2.0 * (v * (xmax - xmin) + xmin) - 1.0).clamp(-1.0, 1.0).acos();
    Pointing { theta, phi }
}

/// Uniform direction inside `pixel`, by rejection against its bounding box.
///
/// The returned longitude is wrapped into `[0, 2π)`.
pub fn rand_ang_in_pixel<P: Pixelization + ?Sized, R: Rng>(
    pix: &P,
    pixel: usize,
    rng: &mut R,
) -> Result<Pointing, SamplingError> {
    let bounds = pix.pixel_bounds(pixel);
    for _ in 0..MAX_PIXEL_ATTEMPTS {
        let mut ang = randang(rng, &bounds);
        ang.phi = ang.phi.rem_euclid(TAU);
        if pix.ang_to_pixel(ang) == pixel {
            return Ok(ang);
        }
    }
    Err(SamplingError::PixelRejection {
        pixel,
        attempts: MAX_PIXEL_ATTEMPTS,
    })
}

/// Angular units for catalog output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AngularUnits {
    /// Colatitude and longitude in radians.
    #[default]
    Radians,
    /// Colatitude and longitude in degrees.
    Degrees,
    /// Right ascension and declination in degrees.
    RaDec,
}

impl AngularUnits {
    /// Convert a pointing to `(first, second)` catalog columns:
    /// `(theta, phi)` for radians and degrees, `(dec, ra)` for RaDec.
    pub fn convert(self, ang: Pointing) -> (f64, f64) {
        match self {
            Self::Radians => (ang.theta, ang.phi),
            Self::Degrees => (rad2deg(ang.theta), rad2deg(ang.phi)),
            Self::RaDec => (theta2dec(ang.theta), phi2ra(ang.phi)),
        }
    }
}
