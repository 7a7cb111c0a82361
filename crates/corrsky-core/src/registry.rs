//! The [`FieldIndex`] registry: a bijection between dense entry indices and
//! (field, redshift-bin) pairs, plus the two traversal tables.
//!
//! Simulations loop over entries in two orders. "Field-fixed" loops walk the
//! redshift bins of one field type; "redshift-fixed" loops walk the field
//! types present in one bin. Both tables are built in a single pass over the
//! input and are never mutated afterwards; [`FieldIndex::rebuild`] replaces
//! the whole registry at once.

use std::collections::HashSet;
use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::IndexError;
use crate::id::{EntryIndex, FieldName, RedshiftName};
use crate::warning;

/// Classification of a physical field type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Galaxy number-density contrast. Sampled into catalogs.
    Galaxies,
    /// Weak-lensing convergence. Source of shear and ellipticities.
    Lensing,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Galaxies => write!(f, "galaxies"),
            Self::Lensing => write!(f, "lensing"),
        }
    }
}

/// Half-open redshift interval `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZRange {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (exclusive).
    pub max: f64,
}

impl ZRange {
    /// Width of the interval.
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Centre of the interval.
    pub fn mid(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// Whether `z` lies in `[min, max)`.
    pub fn contains(&self, z: f64) -> bool {
        z >= self.min && z < self.max
    }
}

/// One physical field type and the entries that carry it, in
/// redshift sub-index order.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRecord {
    name: FieldName,
    kind: FieldKind,
    entries: SmallVec<[EntryIndex; 8]>,
}

impl FieldRecord {
    /// The field name.
    pub fn name(&self) -> FieldName {
        self.name
    }

    /// The field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Entries of this field type, indexed by redshift sub-index.
    pub fn entries(&self) -> &[EntryIndex] {
        &self.entries
    }
}

/// One redshift bin and the entries found in it, in field sub-index order.
#[derive(Clone, Debug, PartialEq)]
pub struct RedshiftBin {
    name: RedshiftName,
    range: Option<ZRange>,
    entries: SmallVec<[EntryIndex; 8]>,
}

impl RedshiftBin {
    /// The bin name.
    pub fn name(&self) -> RedshiftName {
        self.name
    }

    /// The redshift interval, if one was declared.
    pub fn range(&self) -> Option<ZRange> {
        self.range
    }

    /// Entries in this bin, indexed by field sub-index.
    pub fn entries(&self) -> &[EntryIndex] {
        &self.entries
    }
}

#[derive(Clone, Debug, PartialEq)]
struct EntrySlot {
    field: FieldName,
    redshift: RedshiftName,
    // (field-type position, redshift sub-index)
    field_fixed: (usize, usize),
    // (redshift-bin position, field sub-index)
    bin_fixed: (usize, usize),
}

/// Registry of all (field, redshift-bin) entries of a simulation.
///
/// Distinct field names and redshift names are assigned positions in order
/// of first appearance. Every entry index corresponds to exactly one pair.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldIndex {
    fields: IndexMap<FieldName, FieldRecord>,
    bins: IndexMap<RedshiftName, RedshiftBin>,
    entries: Vec<EntrySlot>,
}

impl FieldIndex {
    /// Build a registry from parallel arrays of field and redshift names.
    ///
    /// Position `i` of the inputs becomes `EntryIndex(i)`. Every field type
    /// is tagged [`FieldKind::Galaxies`] and no redshift ranges are set; use
    /// [`FieldIndex::builder`] to attach them.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the arrays differ in length or a pair repeats.
    pub fn build(
        field_names: &[FieldName],
        redshift_names: &[RedshiftName],
    ) -> Result<Self, IndexError> {
        if field_names.len() != redshift_names.len() {
            return Err(IndexError::LengthMismatch {
                fields: field_names.len(),
                redshifts: redshift_names.len(),
            });
        }

        let mut fields: IndexMap<FieldName, FieldRecord> = IndexMap::new();
        let mut bins: IndexMap<RedshiftName, RedshiftBin> = IndexMap::new();
        let mut entries = Vec::with_capacity(field_names.len());
        let mut seen = HashSet::with_capacity(field_names.len());

        for (i, (&f, &z)) in field_names.iter().zip(redshift_names).enumerate() {
            if !seen.insert((f, z)) {
                return Err(IndexError::DuplicateEntry {
                    field: f,
                    redshift: z,
                });
            }
            let n = EntryIndex(i as u32);

            let field_fixed = match fields.entry(f) {
                Entry::Occupied(mut e) => {
                    let sub = e.get().entries.len();
                    let pos = e.index();
                    e.get_mut().entries.push(n);
                    (pos, sub)
                }
                Entry::Vacant(e) => {
                    let pos = e.index();
                    let mut list = SmallVec::new();
                    list.push(n);
                    e.insert(FieldRecord {
                        name: f,
                        kind: FieldKind::Galaxies,
                        entries: list,
                    });
                    (pos, 0)
                }
            };

            let bin_fixed = match bins.entry(z) {
                Entry::Occupied(mut e) => {
                    let sub = e.get().entries.len();
                    let pos = e.index();
                    e.get_mut().entries.push(n);
                    (pos, sub)
                }
                Entry::Vacant(e) => {
                    let pos = e.index();
                    let mut list = SmallVec::new();
                    list.push(n);
                    e.insert(RedshiftBin {
                        name: z,
                        range: None,
                        entries: list,
                    });
                    (pos, 0)
                }
            };

            entries.push(EntrySlot {
                field: f,
                redshift: z,
                field_fixed,
                bin_fixed,
            });
        }

        Ok(Self {
            fields,
            bins,
            entries,
        })
    }

    /// Create a builder that also records field kinds and redshift ranges.
    pub fn builder() -> FieldIndexBuilder {
        FieldIndexBuilder::default()
    }

    /// Replace this registry with one built from new name arrays.
    ///
    /// On error the existing registry is left untouched.
    pub fn rebuild(
        &mut self,
        field_names: &[FieldName],
        redshift_names: &[RedshiftName],
    ) -> Result<(), IndexError> {
        *self = Self::build(field_names, redshift_names)?;
        Ok(())
    }

    /// Number of distinct field types.
    pub fn field_type_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of distinct redshift bins.
    pub fn redshift_bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Total number of (field, redshift) entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// The field record at position `fi`.
    pub fn field_record(&self, fi: usize) -> Result<&FieldRecord, IndexError> {
        self.fields
            .get_index(fi)
            .map(|(_, r)| r)
            .ok_or(IndexError::FieldTypeOutOfRange {
                index: fi,
                count: self.fields.len(),
            })
    }

    /// The redshift bin at position `zi`.
    pub fn redshift_bin(&self, zi: usize) -> Result<&RedshiftBin, IndexError> {
        self.bins
            .get_index(zi)
            .map(|(_, b)| b)
            .ok_or(IndexError::RedshiftBinOutOfRange {
                index: zi,
                count: self.bins.len(),
            })
    }

    /// Number of redshift bins carrying field type `fi`.
    pub fn sub_count_for_field(&self, fi: usize) -> Result<usize, IndexError> {
        Ok(self.field_record(fi)?.entries.len())
    }

    /// Number of field types present in redshift bin `zi`.
    pub fn sub_count_for_bin(&self, zi: usize) -> Result<usize, IndexError> {
        Ok(self.redshift_bin(zi)?.entries.len())
    }

    /// Entry of field type `fi` at redshift sub-index `sub`
    /// (for loops over redshift with the field fixed).
    pub fn entry_given_field_fixed(&self, fi: usize, sub: usize) -> Result<EntryIndex, IndexError> {
        let list = &self.field_record(fi)?.entries;
        list.get(sub).copied().ok_or(IndexError::SubIndexOutOfRange {
            sub,
            count: list.len(),
        })
    }

    /// Entry of redshift bin `zi` at field sub-index `sub`
    /// (for loops over fields with the redshift fixed).
    pub fn entry_given_bin_fixed(&self, zi: usize, sub: usize) -> Result<EntryIndex, IndexError> {
        let list = &self.redshift_bin(zi)?.entries;
        list.get(sub).copied().ok_or(IndexError::SubIndexOutOfRange {
            sub,
            count: list.len(),
        })
    }

    /// Field-type position and redshift sub-index of entry `n`.
    pub fn field_fixed_position(&self, n: EntryIndex) -> Result<(usize, usize), IndexError> {
        Ok(self.slot(n)?.field_fixed)
    }

    /// Redshift-bin position and field sub-index of entry `n`.
    pub fn bin_fixed_position(&self, n: EntryIndex) -> Result<(usize, usize), IndexError> {
        Ok(self.slot(n)?.bin_fixed)
    }

    /// Field and redshift names of entry `n`.
    pub fn name_of(&self, n: EntryIndex) -> Result<(FieldName, RedshiftName), IndexError> {
        let slot = self.slot(n)?;
        Ok((slot.field, slot.redshift))
    }

    /// Entry index of the pair `(field, redshift)`.
    ///
    /// A miss is not an error: it returns `None` and records a warning so
    /// the caller can decide how to proceed.
    pub fn entry_given_names(&self, field: FieldName, redshift: RedshiftName) -> Option<EntryIndex> {
        let found = self
            .entries
            .iter()
            .position(|s| s.field == field && s.redshift == redshift)
            .map(|i| EntryIndex(i as u32));
        if found.is_none() {
            warning::warn(format_args!(
                "FieldIndex: could not find entry f{field}z{redshift}"
            ));
        }
        found
    }

    /// Kind of the field type of entry `n`.
    pub fn kind_of(&self, n: EntryIndex) -> Result<FieldKind, IndexError> {
        let (fi, _) = self.slot(n)?.field_fixed;
        Ok(self.field_record(fi)?.kind)
    }

    /// Redshift interval of the bin of entry `n`, if declared.
    pub fn z_range_of(&self, n: EntryIndex) -> Result<Option<ZRange>, IndexError> {
        let (zi, _) = self.slot(n)?.bin_fixed;
        Ok(self.redshift_bin(zi)?.range)
    }

    /// All entries whose field type has the given kind, in index order.
    pub fn entries_of_kind(&self, kind: FieldKind) -> Vec<EntryIndex> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, s)| self.fields[s.field_fixed.0].kind == kind)
            .map(|(i, _)| EntryIndex(i as u32))
            .collect()
    }

    /// Number of distinct field types with the given kind.
    pub fn field_type_count_of_kind(&self, kind: FieldKind) -> usize {
        self.fields.values().filter(|r| r.kind == kind).count()
    }

    /// Human-readable label `f{field}z{redshift}` of entry `n`.
    pub fn label(&self, n: EntryIndex) -> Result<String, IndexError> {
        let (f, z) = self.name_of(n)?;
        Ok(format!("f{f}z{z}"))
    }

    /// Iterate over all entries as `(index, field, redshift)`.
    pub fn iter(&self) -> impl Iterator<Item = (EntryIndex, FieldName, RedshiftName)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, s)| (EntryIndex(i as u32), s.field, s.redshift))
    }

    fn slot(&self, n: EntryIndex) -> Result<&EntrySlot, IndexError> {
        self.entries
            .get(n.index())
            .ok_or(IndexError::EntryOutOfRange {
                entry: n,
                count: self.entries.len(),
            })
    }
}

/// Builder for [`FieldIndex`] with field kinds and redshift ranges.
///
/// Names are the raw integers of the run configuration. Entries are
/// registered in call order; kinds and ranges may be declared before or
/// after the entries that use them.
#[derive(Clone, Debug, Default)]
pub struct FieldIndexBuilder {
    field_names: Vec<FieldName>,
    redshift_names: Vec<RedshiftName>,
    kinds: Vec<(FieldName, FieldKind)>,
    ranges: Vec<(RedshiftName, ZRange)>,
}

impl FieldIndexBuilder {
    /// Register one (field, redshift) entry.
    pub fn entry(mut self, field: u32, redshift: u32) -> Self {
        self.field_names.push(FieldName(field));
        self.redshift_names.push(RedshiftName(redshift));
        self
    }

    /// Declare the kind of a field type (default: [`FieldKind::Galaxies`]).
    pub fn kind(mut self, field: u32, kind: FieldKind) -> Self {
        self.kinds.push((FieldName(field), kind));
        self
    }

    /// Declare the `[z_min, z_max)` interval of a redshift bin.
    pub fn z_range(mut self, redshift: u32, z_min: f64, z_max: f64) -> Self {
        self.ranges.push((
            RedshiftName(redshift),
            ZRange {
                min: z_min,
                max: z_max,
            },
        ));
        self
    }

    /// Build the registry, validating all declarations.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - an entry pair repeats
    /// - a kind or range names a field or bin with no entry
    /// - a range is empty, inverted, or non-finite
    pub fn build(self) -> Result<FieldIndex, IndexError> {
        let mut index = FieldIndex::build(&self.field_names, &self.redshift_names)?;

        for (name, kind) in self.kinds {
            let record = index
                .fields
                .get_mut(&name)
                .ok_or_else(|| IndexError::UnknownName {
                    name: format!("field {name}"),
                })?;
            record.kind = kind;
        }

        for (name, range) in self.ranges {
            if !range.min.is_finite() || !range.max.is_finite() || range.min >= range.max {
                return Err(IndexError::InvalidRedshiftRange {
                    redshift: name,
                    z_min: range.min,
                    z_max: range.max,
                });
            }
            let bin = index
                .bins
                .get_mut(&name)
                .ok_or_else(|| IndexError::UnknownName {
                    name: format!("redshift bin {name}"),
                })?;
            bin.range = Some(range);
        }

        Ok(index)
    }
}
