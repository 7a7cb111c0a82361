//! Strongly-typed names and the dense [`EntryIndex`].

use std::fmt;

/// Opaque integer name of a physical field type (the `f` in `f1z2`).
///
/// Names are chosen by the user configuration and carry no ordering
/// meaning; the registry assigns dense positions in order of first
/// appearance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(pub u32);

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FieldName {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Opaque integer name of a redshift bin (the `z` in `f1z2`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RedshiftName(pub u32);

impl fmt::Display for RedshiftName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RedshiftName {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Dense linear index of one (field, redshift-bin) entry.
///
/// `EntryIndex(n)` corresponds to the n-th pair handed to
/// [`FieldIndex::build`](crate::FieldIndex::build). Every output array in
/// the workspace (alms, maps, catalogs) is keyed by this index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryIndex(pub u32);

impl EntryIndex {
    /// The index as a `usize`, for slice access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntryIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
