//! Selection functions: per-pixel mask bits, expected-count weights and
//! redshift sampling.
//!
//! A selection is either *separable* (an optional star mask, an optional
//! angular map per field type, and an optional radial curve per field type)
//! or *joint* (one weight table per entry). Missing separable components
//! contribute a factor of 1.

use indexmap::IndexMap;
use rand::Rng;

use corrsky_core::{EntryIndex, FieldIndex, FieldName, ZRange};

use crate::error::SelectionError;
use crate::maximize::maximize;
use crate::radial::RadialCurve;

/// Default tolerance when locating the peak of a radial curve.
pub const DEFAULT_Z_TOLERANCE: f64 = 1e-4;

/// Rejection draws before [`SelectionFunction::sample_redshift`] gives up.
pub const MAX_REDSHIFT_ATTEMPTS: usize = 1_000_000;

/// Why a pixel is excluded from sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MaskBit {
    /// The pixel is sampled.
    Valid = 0,
    /// The star mask is zero at this pixel.
    StarMasked = 1,
    /// The angular weight is exactly zero.
    OutsideFootprint = 2,
    /// The angular weight is negative or not finite.
    NegativeOrInvalid = 3,
}

impl MaskBit {
    /// Numeric code written to catalogs.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns `true` for [`MaskBit::Valid`].
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Outcome of [`SelectionFunction::sample_redshift`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RedshiftDraw {
    /// A redshift drawn from the radial selection.
    Sampled(f64),
    /// The pixel is masked; no randomness was consumed.
    Masked(MaskBit),
}

#[derive(Clone, Debug)]
struct EntrySelection {
    angular: Option<usize>,
    radial: Option<usize>,
    z_range: Option<ZRange>,
    radial_integral: f64,
    y_max: f64,
}

#[derive(Clone, Debug)]
enum Layout {
    Separable {
        angular: Vec<Vec<f64>>,
        radial: Vec<RadialCurve>,
    },
    Joint(Vec<Vec<f64>>),
}

/// Immutable selection function over a [`FieldIndex`] and a pixelization.
#[derive(Clone, Debug)]
pub struct SelectionFunction {
    pixel_count: usize,
    scale: f64,
    star_mask: Option<Vec<f64>>,
    layout: Layout,
    entries: Vec<EntrySelection>,
}

impl SelectionFunction {
    /// Start building a selection for `index` on `pixel_count` pixels.
    pub fn builder(index: &FieldIndex, pixel_count: usize) -> SelectionBuilder<'_> {
        SelectionBuilder {
            index,
            pixel_count,
            scale: 1.0,
            tolerance: DEFAULT_Z_TOLERANCE,
            star_mask: None,
            angular: IndexMap::new(),
            radial: IndexMap::new(),
            joint: None,
        }
    }

    /// Selection with weight 1 everywhere and no masking.
    pub fn uniform(index: &FieldIndex, pixel_count: usize) -> Result<Self, SelectionError> {
        Self::builder(index, pixel_count).build()
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Overall scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Whether redshift sampling is available.
    pub fn is_separable(&self) -> bool {
        matches!(self.layout, Layout::Separable { .. })
    }

    /// Mask bit of `entry` at `pixel`.
    pub fn mask_bit(&self, entry: EntryIndex, pixel: usize) -> Result<MaskBit, SelectionError> {
        let e = self.check(entry, pixel)?;
        Ok(self.bit_at(e, pixel))
    }

    /// Expected galaxy density of `entry` at `pixel`, per square arcminute.
    ///
    /// Separable: `scale * angular(pixel) * radial_integral(entry)`, where the
    /// radial factor is the radial curve integrated over the entry's bin.
    /// Joint: `scale * table[entry][pixel]`.
    pub fn weight(&self, entry: EntryIndex, pixel: usize) -> Result<f64, SelectionError> {
        let e = self.check(entry, pixel)?;
        Ok(self.weight_at(e, pixel))
    }

    /// Radial selection integrated over the bin of `entry` (1 for a joint
    /// selection or a flat curve).
    pub fn radial_integral(&self, entry: EntryIndex) -> Result<f64, SelectionError> {
        self.entry(entry).map(|s| s.radial_integral)
    }

    /// Draw a redshift for a galaxy of `entry` in `pixel`.
    ///
    /// # Errors
    ///
    /// - [`SelectionError::NotSeparable`] for a joint selection.
    /// - [`SelectionError::MissingRedshiftRange`] if the entry's bin has no
    ///   interval.
    /// - [`SelectionError::ZeroRadialDensity`] if the radial curve vanishes
    ///   over the bin.
    pub fn sample_redshift<R: Rng>(
        &self,
        entry: EntryIndex,
        pixel: usize,
        rng: &mut R,
    ) -> Result<RedshiftDraw, SelectionError> {
        let sel = self.entry(entry)?;
        let Layout::Separable { radial, .. } = &self.layout else {
            return Err(SelectionError::NotSeparable);
        };
        let e = self.check(entry, pixel)?;
        let bit = self.bit_at(e, pixel);
        if !bit.is_valid() {
            return Ok(RedshiftDraw::Masked(bit));
        }
        let range = sel
            .z_range
            .ok_or(SelectionError::MissingRedshiftRange { entry })?;

        let Some(curve) = sel.radial.map(|r| &radial[r]).filter(|c| !c.is_flat()) else {
            return Ok(RedshiftDraw::Sampled(uniform_in(rng, range)));
        };
        if sel.y_max <= 0.0 {
            return Err(SelectionError::ZeroRadialDensity { entry });
        }
        for _ in 0..MAX_REDSHIFT_ATTEMPTS {
            let z = uniform_in(rng, range);
            let y = rng.random::<f64>() * sel.y_max;
            if y <= curve.density(z) {
                return Ok(RedshiftDraw::Sampled(z));
            }
        }
        Err(SelectionError::ZeroRadialDensity { entry })
    }

    pub(crate) fn bit_at(&self, e: usize, pixel: usize) -> MaskBit {
        if let Some(mask) = &self.star_mask {
            if mask[pixel] == 0.0 {
                return MaskBit::StarMasked;
            }
        }
        let w = self.angular_at(e, pixel);
        if w == 0.0 {
            MaskBit::OutsideFootprint
        } else if !w.is_finite() || w < 0.0 {
            MaskBit::NegativeOrInvalid
        } else {
            MaskBit::Valid
        }
    }

    pub(crate) fn weight_at(&self, e: usize, pixel: usize) -> f64 {
        match &self.layout {
            Layout::Separable { .. } => {
                self.scale * self.angular_at(e, pixel) * self.entries[e].radial_integral
            }
            Layout::Joint(table) => self.scale * table[e][pixel],
        }
    }

    fn angular_at(&self, e: usize, pixel: usize) -> f64 {
        match &self.layout {
            Layout::Separable { angular, .. } => {
                self.entries[e].angular.map_or(1.0, |a| angular[a][pixel])
            }
            Layout::Joint(table) => table[e][pixel],
        }
    }

    fn entry(&self, entry: EntryIndex) -> Result<&EntrySelection, SelectionError> {
        self.entries
            .get(entry.index())
            .ok_or(SelectionError::EntryOutOfRange {
                entry,
                count: self.entries.len(),
            })
    }

    fn check(&self, entry: EntryIndex, pixel: usize) -> Result<usize, SelectionError> {
        self.entry(entry)?;
        if pixel >= self.pixel_count {
            return Err(SelectionError::PixelOutOfRange {
                pixel,
                count: self.pixel_count,
            });
        }
        Ok(entry.index())
    }
}

fn uniform_in<R: Rng>(rng: &mut R, range: ZRange) -> f64 {
    range.min + rng.random::<f64>() * range.width()
}

/// Builder for [`SelectionFunction`].
#[derive(Debug)]
pub struct SelectionBuilder<'a> {
    index: &'a FieldIndex,
    pixel_count: usize,
    scale: f64,
    tolerance: f64,
    star_mask: Option<Vec<f64>>,
    angular: IndexMap<FieldName, Vec<f64>>,
    radial: IndexMap<FieldName, RadialCurve>,
    joint: Option<Vec<Vec<f64>>>,
}

impl SelectionBuilder<'_> {
    /// Multiply every weight by `scale` (default 1).
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Tolerance of the radial peak search (default
    /// [`DEFAULT_Z_TOLERANCE`]).
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Star mask shared by all entries; pixels where it is 0 are masked.
    pub fn star_mask(mut self, mask: Vec<f64>) -> Self {
        self.star_mask = Some(mask);
        self
    }

    /// Angular weight map of one field type. A later call for the same
    /// field replaces the earlier map.
    pub fn angular(mut self, field: FieldName, map: Vec<f64>) -> Self {
        self.angular.insert(field, map);
        self
    }

    /// Radial curve of one field type.
    pub fn radial(mut self, field: FieldName, curve: RadialCurve) -> Self {
        self.radial.insert(field, curve);
        self
    }

    /// Joint weight tables, one per entry in index order.
    pub fn joint(mut self, tables: Vec<Vec<f64>>) -> Self {
        self.joint = Some(tables);
        self
    }

    /// Validate the components and precompute per-entry radial factors.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a map has the wrong length, a component names an
    /// unknown field, joint tables are mixed with separable components, a
    /// setting is out of range, or a tabulated radial curve is attached to
    /// an entry without a redshift range.
    pub fn build(self) -> Result<SelectionFunction, SelectionError> {
        if !self.scale.is_finite() || self.scale < 0.0 {
            return Err(SelectionError::InvalidParameter {
                name: "scale",
                value: self.scale,
            });
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(SelectionError::InvalidParameter {
                name: "tolerance",
                value: self.tolerance,
            });
        }
        let npix = self.pixel_count;
        if let Some(mask) = &self.star_mask {
            check_len("star mask", npix, mask.len())?;
        }

        let n = self.index.entry_count();
        let mut entries = Vec::with_capacity(n);

        let layout = if let Some(tables) = self.joint {
            if !self.angular.is_empty() || !self.radial.is_empty() {
                return Err(SelectionError::MixedLayout);
            }
            check_len("joint selection tables", n, tables.len())?;
            for table in &tables {
                check_len("joint selection table", npix, table.len())?;
            }
            for i in 0..n {
                let z_range = self.index.z_range_of(EntryIndex(i as u32))?;
                entries.push(EntrySelection {
                    angular: None,
                    radial: None,
                    z_range,
                    radial_integral: 1.0,
                    y_max: 1.0,
                });
            }
            Layout::Joint(tables)
        } else {
            let known: Vec<FieldName> = self.index.iter().map(|(_, f, _)| f).collect();
            for field in self.angular.keys().chain(self.radial.keys()) {
                if !known.contains(field) {
                    return Err(SelectionError::UnknownField { field: *field });
                }
            }
            for map in self.angular.values() {
                check_len("angular selection", npix, map.len())?;
            }

            for (n, field, _) in self.index.iter() {
                let z_range = self.index.z_range_of(n)?;
                let radial = self.radial.get_index_of(&field);
                let mut sel = EntrySelection {
                    angular: self.angular.get_index_of(&field),
                    radial,
                    z_range,
                    radial_integral: 1.0,
                    y_max: 1.0,
                };
                if let Some(curve) = radial.map(|r| &self.radial[r]).filter(|c| !c.is_flat()) {
                    let range = z_range.ok_or(SelectionError::MissingRedshiftRange { entry: n })?;
                    sel.radial_integral = curve.integral_over(range);
                    sel.y_max = maximize(|z| curve.density(z), range.min, range.max, self.tolerance).1;
                    tracing::debug!(
                        entry = %n,
                        radial_integral = sel.radial_integral,
                        y_max = sel.y_max,
                        "radial selection prepared"
                    );
                }
                entries.push(sel);
            }
            Layout::Separable {
                angular: self.angular.into_values().collect(),
                radial: self.radial.into_values().collect(),
            }
        };

        Ok(SelectionFunction {
            pixel_count: npix,
            scale: self.scale,
            star_mask: self.star_mask,
            layout,
            entries,
        })
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), SelectionError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SelectionError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn index() -> FieldIndex {
        FieldIndex::builder()
            .entry(1, 1)
            .entry(1, 2)
            .entry(2, 1)
            .z_range(1, 0.0, 0.5)
            .z_range(2, 0.5, 1.0)
            .build()
            .unwrap()
    }

    fn hat() -> RadialCurve {
        RadialCurve::tabulated(vec![0.0, 0.25, 0.5, 1.0], vec![0.0, 2.0, 0.0, 0.0]).unwrap()
    }

    #[test]
    fn mask_bits_follow_evaluation_order() {
        let idx = index();
        let sel = SelectionFunction::builder(&idx, 5)
            .star_mask(vec![1.0, 0.0, 1.0, 1.0, 0.0])
            .angular(FieldName(1), vec![1.0, 1.0, 0.0, -2.0, -2.0])
            .build()
            .unwrap();
        let e = EntryIndex(0);
        assert_eq!(sel.mask_bit(e, 0).unwrap(), MaskBit::Valid);
        assert_eq!(sel.mask_bit(e, 1).unwrap(), MaskBit::StarMasked);
        assert_eq!(sel.mask_bit(e, 2).unwrap(), MaskBit::OutsideFootprint);
        assert_eq!(sel.mask_bit(e, 3).unwrap(), MaskBit::NegativeOrInvalid);
        // Star mask wins over a bad angular weight.
        assert_eq!(sel.mask_bit(e, 4).unwrap(), MaskBit::StarMasked);
        // Field 2 has no angular map: only the star mask applies.
        assert_eq!(sel.mask_bit(EntryIndex(2), 2).unwrap(), MaskBit::Valid);
        assert_eq!(MaskBit::NegativeOrInvalid.code(), 3);
    }

    #[test]
    fn nan_weight_is_invalid() {
        let idx = index();
        let sel = SelectionFunction::builder(&idx, 2)
            .angular(FieldName(2), vec![f64::NAN, f64::INFINITY])
            .build()
            .unwrap();
        assert_eq!(sel.mask_bit(EntryIndex(2), 0).unwrap(), MaskBit::NegativeOrInvalid);
        assert_eq!(sel.mask_bit(EntryIndex(2), 1).unwrap(), MaskBit::NegativeOrInvalid);
    }

    #[test]
    fn separable_weight_uses_bin_integral() {
        let idx = index();
        let sel = SelectionFunction::builder(&idx, 2)
            .scale(3.0)
            .angular(FieldName(1), vec![0.5, 1.0])
            .radial(FieldName(1), hat())
            .build()
            .unwrap();
        // Hat over [0, 0.5] peaks at 2 with near-triangular shape, area ~0.5.
        let area = sel.radial_integral(EntryIndex(0)).unwrap();
        assert!(area > 0.4 && area < 0.65, "{area}");
        let w = sel.weight(EntryIndex(0), 0).unwrap();
        assert!((w - 3.0 * 0.5 * area).abs() < 1e-12);
        // Field 2 is flat in both components.
        assert_eq!(sel.weight(EntryIndex(2), 1).unwrap(), 3.0);
    }

    #[test]
    fn constant_radial_density_integrates_over_bin_width() {
        let idx = index();
        let constant = RadialCurve::tabulated(vec![0.0, 0.5, 1.0], vec![2.0, 2.0, 2.0]).unwrap();
        let sel = SelectionFunction::builder(&idx, 2)
            .radial(FieldName(1), constant)
            .build()
            .unwrap();
        // dn/dz = 2 over [0, 0.5) and [0.5, 1.0).
        assert!((sel.weight(EntryIndex(0), 0).unwrap() - 1.0).abs() < 1e-12);
        assert!((sel.weight(EntryIndex(1), 1).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn joint_tables() {
        let idx = index();
        let sel = SelectionFunction::builder(&idx, 2)
            .scale(2.0)
            .joint(vec![vec![1.0, 0.0], vec![0.5, 0.25], vec![-1.0, 4.0]])
            .build()
            .unwrap();
        assert!(!sel.is_separable());
        assert_eq!(sel.weight(EntryIndex(1), 1).unwrap(), 0.5);
        assert_eq!(sel.mask_bit(EntryIndex(0), 1).unwrap(), MaskBit::OutsideFootprint);
        assert_eq!(sel.mask_bit(EntryIndex(2), 0).unwrap(), MaskBit::NegativeOrInvalid);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            sel.sample_redshift(EntryIndex(0), 0, &mut rng),
            Err(SelectionError::NotSeparable)
        );
    }

    #[test]
    fn build_errors() {
        let idx = index();
        let mixed = SelectionFunction::builder(&idx, 2)
            .angular(FieldName(1), vec![1.0, 1.0])
            .joint(vec![vec![1.0; 2]; 3])
            .build();
        assert_eq!(mixed.unwrap_err(), SelectionError::MixedLayout);

        let unknown = SelectionFunction::builder(&idx, 2)
            .angular(FieldName(9), vec![1.0, 1.0])
            .build();
        assert_eq!(
            unknown.unwrap_err(),
            SelectionError::UnknownField { field: FieldName(9) }
        );

        let short = SelectionFunction::builder(&idx, 3).star_mask(vec![1.0]).build();
        assert!(matches!(
            short,
            Err(SelectionError::LengthMismatch { expected: 3, actual: 1, .. })
        ));

        let bad_tol = SelectionFunction::builder(&idx, 3).tolerance(0.0).build();
        assert!(matches!(
            bad_tol,
            Err(SelectionError::InvalidParameter { name: "tolerance", .. })
        ));
    }

    #[test]
    fn tabulated_curve_needs_range() {
        let idx = FieldIndex::builder().entry(1, 1).build().unwrap();
        let err = SelectionFunction::builder(&idx, 1)
            .radial(FieldName(1), hat())
            .build()
            .unwrap_err();
        assert_eq!(err, SelectionError::MissingRedshiftRange { entry: EntryIndex(0) });

        // A flat curve builds, but sampling needs the range.
        let sel = SelectionFunction::uniform(&idx, 1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            sel.sample_redshift(EntryIndex(0), 0, &mut rng),
            Err(SelectionError::MissingRedshiftRange { entry: EntryIndex(0) })
        );
    }

    #[test]
    fn masked_pixel_consumes_no_randomness() {
        let idx = index();
        let sel = SelectionFunction::builder(&idx, 2)
            .star_mask(vec![0.0, 1.0])
            .radial(FieldName(1), hat())
            .build()
            .unwrap();
        let mut a = ChaCha8Rng::seed_from_u64(4);
        let b = a.clone();
        assert_eq!(
            sel.sample_redshift(EntryIndex(0), 0, &mut a).unwrap(),
            RedshiftDraw::Masked(MaskBit::StarMasked)
        );
        assert_eq!(a, b);
    }

    #[test]
    fn redshifts_follow_radial_curve() {
        let idx = index();
        let sel = SelectionFunction::builder(&idx, 1)
            .radial(FieldName(1), hat())
            .build()
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let draws: Vec<f64> = (0..4000)
            .map(|_| match sel.sample_redshift(EntryIndex(0), 0, &mut rng).unwrap() {
                RedshiftDraw::Sampled(z) => z,
                RedshiftDraw::Masked(bit) => panic!("unexpected mask {bit:?}"),
            })
            .collect();
        assert!(draws.iter().all(|&z| (0.0..0.5).contains(&z)));
        // The curve peaks at 0.25 and is symmetric about it on [0, 0.5].
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        assert!((mean - 0.25).abs() < 0.02, "{mean}");
        let near_peak = draws.iter().filter(|&&z| (z - 0.25).abs() < 0.125).count();
        assert!(near_peak as f64 / draws.len() as f64 > 0.6);
    }

    #[test]
    fn flat_curve_gives_uniform_redshifts() {
        let idx = index();
        let sel = SelectionFunction::uniform(&idx, 1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut sum = 0.0;
        for _ in 0..2000 {
            match sel.sample_redshift(EntryIndex(1), 0, &mut rng).unwrap() {
                RedshiftDraw::Sampled(z) => {
                    assert!((0.5..1.0).contains(&z));
                    sum += z;
                }
                RedshiftDraw::Masked(_) => unreachable!(),
            }
        }
        assert!((sum / 2000.0 - 0.75).abs() < 0.02);
    }

    #[test]
    fn zero_curve_is_reported() {
        let idx = index();
        // Hat is zero over the second bin [0.5, 1.0).
        let sel = SelectionFunction::builder(&idx, 1)
            .radial(FieldName(1), hat())
            .build()
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(
            sel.sample_redshift(EntryIndex(1), 0, &mut rng),
            Err(SelectionError::ZeroRadialDensity { entry: EntryIndex(1) })
        );
    }

    #[test]
    fn out_of_range_queries() {
        let idx = index();
        let sel = SelectionFunction::uniform(&idx, 4).unwrap();
        assert_eq!(
            sel.weight(EntryIndex(3), 0),
            Err(SelectionError::EntryOutOfRange { entry: EntryIndex(3), count: 3 })
        );
        assert_eq!(
            sel.mask_bit(EntryIndex(0), 4),
            Err(SelectionError::PixelOutOfRange { pixel: 4, count: 4 })
        );
    }
}
