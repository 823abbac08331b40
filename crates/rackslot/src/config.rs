//! Warehouse configuration.

use serde::Deserialize;

use rackslot_core::{Grid, DEFAULT_ITEM_TYPE};

/// Default number of source entries moved per batch.
pub const DEFAULT_CHUNK_SIZE: usize = 450;

/// Configuration for a [`Warehouse`](crate::Warehouse).
///
/// Deserializable so an embedding application can load it from its own
/// config file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Shelf grid dimensions.
    pub grid: Grid,
    /// Upper bound on source entries per relocation batch. The store's
    /// batch limit may lower it further.
    pub chunk_size: usize,
    /// Type tag for stock added without one.
    pub default_item_type: String,
    /// Fail a relocation whose target gained entries since it was chosen.
    pub guard_empty_target: bool,
    /// Reject locations outside `grid` before touching the store.
    pub enforce_grid: bool,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            grid: Grid::DEFAULT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            default_item_type: DEFAULT_ITEM_TYPE.to_string(),
            guard_empty_target: false,
            enforce_grid: true,
        }
    }
}

impl WarehouseConfig {
    pub fn with_grid(mut self, grid: Grid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_default_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.default_item_type = item_type.into();
        self
    }

    pub fn with_guard_empty_target(mut self, guard: bool) -> Self {
        self.guard_empty_target = guard;
        self
    }

    pub fn with_enforce_grid(mut self, enforce: bool) -> Self {
        self.enforce_grid = enforce;
        self
    }
}
