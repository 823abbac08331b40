//! Read-boundary validation: classify raw store records.
//!
//! A record with a missing key or a quantity that is absent, unparsable,
//! zero or negative is corrupt. Corrupt records are never read as zero
//! stock; callers route them to cleanup.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entry::{InventoryEntry, RawEntry, DEFAULT_ITEM_TYPE};
use crate::types::ItemKey;

/// Why a stored record could not be read as an inventory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorruptReason {
    /// Neither the `item_key` field nor the record id yields a key.
    MissingItemKey,
    /// The quantity field is missing or not an integer.
    MalformedQuantity,
    /// The quantity is zero or negative.
    NonPositiveQuantity(i64),
}

impl fmt::Display for CorruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingItemKey => f.write_str("missing item key"),
            Self::MalformedQuantity => f.write_str("malformed quantity"),
            Self::NonPositiveQuantity(q) => write!(f, "non-positive quantity {q}"),
        }
    }
}

/// A record that must be deleted rather than used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptEntry {
    /// Record id, needed to delete it.
    pub doc_id: String,
    pub reason: CorruptReason,
}

/// Outcome of classifying one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRecord {
    Valid(InventoryEntry),
    Corrupt(CorruptEntry),
}

impl EntryRecord {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn valid(self) -> Option<InventoryEntry> {
        match self {
            Self::Valid(entry) => Some(entry),
            Self::Corrupt(_) => None,
        }
    }
}

/// Classify a raw record.
///
/// The item key comes from the `item_key` field, falling back to the
/// record id. A missing type tag becomes [`DEFAULT_ITEM_TYPE`].
pub fn classify_entry(raw: &RawEntry) -> EntryRecord {
    let corrupt = |reason| {
        EntryRecord::Corrupt(CorruptEntry {
            doc_id: raw.doc_id.clone(),
            reason,
        })
    };

    let key = raw
        .item_key
        .as_deref()
        .and_then(|k| ItemKey::new(k).ok())
        .or_else(|| ItemKey::new(&raw.doc_id).ok());
    let Some(item_key) = key else {
        return corrupt(CorruptReason::MissingItemKey);
    };

    let quantity = match raw.quantity {
        None => return corrupt(CorruptReason::MalformedQuantity),
        Some(q) if q <= 0 => return corrupt(CorruptReason::NonPositiveQuantity(q)),
        Some(q) => q as u64,
    };

    let item_type = raw
        .item_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_ITEM_TYPE)
        .to_string();

    EntryRecord::Valid(InventoryEntry {
        item_key,
        quantity,
        item_type,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        last_movement: raw.last_movement.clone(),
    })
}

/// Split raw records into valid entries and corrupt records, keeping order.
pub fn partition_entries<'a>(
    raws: impl IntoIterator<Item = &'a RawEntry>,
) -> (Vec<InventoryEntry>, Vec<CorruptEntry>) {
    let mut valid = Vec::new();
    let mut corrupt = Vec::new();
    for raw in raws {
        match classify_entry(raw) {
            EntryRecord::Valid(entry) => valid.push(entry),
            EntryRecord::Corrupt(c) => corrupt.push(c),
        }
    }
    (valid, corrupt)
}
