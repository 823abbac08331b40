//! Batched writes: the unit of atomicity a store offers.
//!
//! A [`Batch`] is applied all-or-nothing. There is no atomicity across
//! batches; callers that need more writes than one batch holds must
//! expose the partial state themselves.

use rackslot_core::{ItemKey, Location};

/// Fields merged into an entry record.
///
/// Fields left as `None` are not touched on an existing record. The
/// quantity is never overwritten: `quantity_delta` is added to whatever
/// the record holds at commit time (see [`apply_increment`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPatch {
    pub quantity_delta: i64,
    pub item_type: Option<String>,
    /// Only written when the record has no creation time yet.
    pub created_at: Option<i64>,
    pub updated_at: i64,
    pub last_movement: Option<String>,
}

impl EntryPatch {
    /// A patch that only adjusts the quantity and stamps `updated_at`.
    pub fn increment(delta: i64, now: i64) -> Self {
        Self {
            quantity_delta: delta,
            item_type: None,
            created_at: None,
            updated_at: now,
            last_movement: None,
        }
    }
}

/// One write inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Create or merge-update the record `(location, item_key)`.
    MergeEntry {
        location: Location,
        item_key: ItemKey,
        patch: EntryPatch,
    },
    /// Delete the record `(location, doc_id)`. Deleting a missing record is
    /// not an error.
    DeleteEntry { location: Location, doc_id: String },
    /// Fail the whole batch if the location holds any entry.
    ExpectEmpty(Location),
    /// Fail the whole batch unless the record `(location, item_key)` holds
    /// at least `min` units. A missing or malformed record holds none.
    ExpectQuantityAtLeast {
        location: Location,
        item_key: ItemKey,
        min: u64,
    },
}

impl WriteOp {
    /// Whether this op only checks state and writes nothing.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            WriteOp::ExpectEmpty(_) | WriteOp::ExpectQuantityAtLeast { .. }
        )
    }
}

/// An ordered list of writes committed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<WriteOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    pub fn merge_entry(&mut self, location: Location, item_key: ItemKey, patch: EntryPatch) {
        self.ops.push(WriteOp::MergeEntry {
            location,
            item_key,
            patch,
        });
    }

    pub fn delete_entry(&mut self, location: Location, doc_id: impl Into<String>) {
        self.ops.push(WriteOp::DeleteEntry {
            location,
            doc_id: doc_id.into(),
        });
    }

    pub fn expect_empty(&mut self, location: Location) {
        self.ops.push(WriteOp::ExpectEmpty(location));
    }

    pub fn expect_quantity_at_least(&mut self, location: Location, item_key: ItemKey, min: u64) {
        self.ops.push(WriteOp::ExpectQuantityAtLeast {
            location,
            item_key,
            min,
        });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Preconditions first, so a backend can check them before writing.
    pub(crate) fn preconditions(&self) -> impl Iterator<Item = &WriteOp> {
        self.ops.iter().filter(|op| op.is_precondition())
    }
}

impl IntoIterator for Batch {
    type Item = WriteOp;
    type IntoIter = std::vec::IntoIter<WriteOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// Whether a stored quantity satisfies an `ExpectQuantityAtLeast` bound.
pub(crate) fn holds_at_least(current: Option<i64>, min: u64) -> bool {
    u64::try_from(current.unwrap_or(0)).is_ok_and(|q| q >= min)
}

/// Write-time increment semantics shared by every backend.
///
/// A missing or malformed current value counts as zero. Saturates instead
/// of wrapping.
pub fn apply_increment(current: Option<i64>, delta: i64) -> i64 {
    current.unwrap_or(0).saturating_add(delta)
}
