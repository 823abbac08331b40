//! Strong type definitions for rackslot.
//!
//! Identifiers are newtypes so a raw string cannot be passed where a
//! sanitized key is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::location::{Level, Location, Shelf};

/// An item-type identifier, unique within one location.
///
/// Keys are stored as document ids, so `/` is replaced with `_` and
/// surrounding whitespace is trimmed. An empty key is rejected.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey(String);

impl ItemKey {
    /// Sanitize and validate a raw item key.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let key = sanitize_key(raw.as_ref());
        if key.is_empty() {
            return Err(CoreError::InvalidItemKey);
        }
        Ok(Self(key))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Replace path separators and trim, matching how keys are persisted.
pub fn sanitize_key(raw: &str) -> String {
    raw.replace('/', "_").trim().to_string()
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey({})", self.0)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ItemKey {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

/// Dimensions of the physical shelf grid.
///
/// Shelves are numbered `1..=shelves`, levels `1..=levels` with level 1 at
/// the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub shelves: u8,
    pub levels: u8,
}

impl Grid {
    /// The default warehouse: 38 shelves with 5 levels each.
    pub const DEFAULT: Self = Self {
        shelves: 38,
        levels: 5,
    };

    pub const fn new(shelves: u8, levels: u8) -> Self {
        Self { shelves, levels }
    }

    /// Levels from the top down (`5, 4, 3, 2, 1` for the default grid).
    pub fn levels_top_down(&self) -> Vec<Level> {
        (1..=self.levels).rev().map(Level::new).collect()
    }

    /// Levels from the bottom up.
    pub fn levels_bottom_up(&self) -> Vec<Level> {
        (1..=self.levels).map(Level::new).collect()
    }

    /// All shelves on the grid, in order.
    pub fn shelves(&self) -> impl Iterator<Item = Shelf> {
        (1..=self.shelves).map(Shelf::new)
    }

    /// Whether a location lies on this grid.
    pub fn contains(&self, location: &Location) -> bool {
        let shelf = location.shelf.number();
        let level = location.level.get();
        (1..=self.shelves).contains(&shelf) && (1..=self.levels).contains(&level)
    }

    /// Reject locations that are not on the grid.
    pub fn check(&self, location: &Location) -> Result<()> {
        if self.contains(location) {
            Ok(())
        } else {
            Err(CoreError::OffGrid(*location))
        }
    }

    /// Total number of slots.
    pub fn slot_count(&self) -> usize {
        self.shelves as usize * self.levels as usize
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_sanitized() {
        let key = ItemKey::new("  pallet/42 ").unwrap();
        assert_eq!(key.as_str(), "pallet_42");
    }

    #[test]
    fn test_item_key_empty_rejected() {
        assert_eq!(ItemKey::new("   "), Err(CoreError::InvalidItemKey));
        assert_eq!(ItemKey::new(""), Err(CoreError::InvalidItemKey));
    }

    #[test]
    fn test_item_key_serde_validates() {
        let key: ItemKey = serde_json::from_str("\"a/b\"").unwrap();
        assert_eq!(key.as_str(), "a_b");
        assert!(serde_json::from_str::<ItemKey>("\" \"").is_err());
    }

    #[test]
    fn test_grid_level_orders() {
        let grid = Grid::default();
        let top_down: Vec<u8> = grid.levels_top_down().iter().map(|l| l.get()).collect();
        let bottom_up: Vec<u8> = grid.levels_bottom_up().iter().map(|l| l.get()).collect();
        assert_eq!(top_down, vec![5, 4, 3, 2, 1]);
        assert_eq!(bottom_up, vec![1, 2, 3, 4, 5]);
        assert_eq!(grid.slot_count(), 190);
    }

    #[test]
    fn test_grid_contains() {
        let grid = Grid::default();
        assert!(grid.contains(&Location::new(Shelf::new(38), Level::new(5))));
        assert!(!grid.contains(&Location::new(Shelf::new(39), Level::new(1))));
        assert!(!grid.contains(&Location::new(Shelf::new(1), Level::new(0))));
        assert!(matches!(
            grid.check(&Location::new(Shelf::new(0), Level::new(1))),
            Err(CoreError::OffGrid(_))
        ));
    }
}
