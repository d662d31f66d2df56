//! Data records owned outside the graph.
//!
//! Every entity points at two records: the original one edited by the user and
//! the evaluated (copy-on-write) one the evaluation writes into. Both are
//! shared handles because their owner is the database, not the graph.

use parking_lot::RwLock;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u64);

impl RecordId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record#{}", self.0)
    }
}

/// Tag bits on a record. The `RECALC_*` bits are set by whoever edits the
/// original record; the others are database bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RecordTag(u32);

impl RecordTag {
    pub const RECALC_OBJECT: Self = Self(1 << 0);
    pub const RECALC_DATA: Self = Self(1 << 1);
    pub const RECALC_TIME: Self = Self(1 << 2);
    pub const RECALC_SHADING: Self = Self(1 << 3);
    pub const RECALC_COPY_ON_WRITE: Self = Self(1 << 4);
    pub const RECALC_ALL: Self = Self(
        Self::RECALC_OBJECT.0
            | Self::RECALC_DATA.0
            | Self::RECALC_TIME.0
            | Self::RECALC_SHADING.0
            | Self::RECALC_COPY_ON_WRITE.0,
    );

    pub const EXTERN: Self = Self(1 << 8);
    pub const DOIT: Self = Self(1 << 9);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for RecordTag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RecordTag {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for RecordTag {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub tag: RecordTag,
    /// Set once a lazily duplicated evaluated record has been filled in.
    /// Meaningless on original records.
    pub expanded: bool,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::next(),
            name: name.into(),
            tag: RecordTag::empty(),
            expanded: false,
        }
    }

    pub fn with_tag(mut self, tag: RecordTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn expanded(mut self) -> Self {
        self.expanded = true;
        self
    }

    pub fn into_ref(self) -> RecordRef {
        Arc::new(RwLock::new(self))
    }
}

/// Shared handle to a record owned by the database.
pub type RecordRef = Arc<RwLock<Record>>;
