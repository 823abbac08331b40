//! Inventory entries: one item type's quantity at one location.

use serde::{Deserialize, Serialize};

use crate::types::ItemKey;

/// Type tag written when a record carries none.
pub const DEFAULT_ITEM_TYPE: &str = "steg";

/// A validated inventory entry. `quantity` is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Item-type identifier, unique within the location.
    pub item_key: ItemKey,
    /// Units stored. Never zero: an emptied entry is deleted instead.
    pub quantity: u64,
    /// Item type tag.
    pub item_type: String,
    /// When stock of this item first arrived (Unix ms).
    pub created_at: Option<i64>,
    /// Last write (Unix ms).
    pub updated_at: Option<i64>,
    /// Where the stock last came from or went to.
    pub last_movement: Option<String>,
}

impl InventoryEntry {
    /// A fresh entry with the default type tag and no bookkeeping.
    pub fn new(item_key: ItemKey, quantity: u64) -> Self {
        Self {
            item_key,
            quantity,
            item_type: DEFAULT_ITEM_TYPE.to_string(),
            created_at: None,
            updated_at: None,
            last_movement: None,
        }
    }

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    pub fn with_created_at(mut self, at: i64) -> Self {
        self.created_at = Some(at);
        self
    }
}

/// An entry exactly as read from the store, before validation.
///
/// Stores map unreadable fields to `None` rather than guessing a value;
/// [`classify_entry`](crate::validation::classify_entry) decides what the
/// record is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    /// The record's key within its location.
    pub doc_id: String,
    pub item_key: Option<String>,
    /// `None` when the field is missing or not an integer.
    pub quantity: Option<i64>,
    pub item_type: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub last_movement: Option<String>,
}

impl RawEntry {
    /// The raw form of a valid entry, keyed by its item key.
    pub fn from_entry(entry: &InventoryEntry) -> Self {
        Self {
            doc_id: entry.item_key.as_str().to_string(),
            item_key: Some(entry.item_key.as_str().to_string()),
            quantity: i64::try_from(entry.quantity).ok(),
            item_type: Some(entry.item_type.clone()),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            last_movement: entry.last_movement.clone(),
        }
    }
}
