//! Error types for the warehouse facade.

use rackslot_core::{CoreError, ItemKey, Location};
use rackslot_store::StoreError;
use thiserror::Error;

/// Errors from a whole-slot relocation.
///
/// A relocation is committed in several batches and is not atomic as a
/// whole. [`RelocationError::Store`] says how far it got.
#[derive(Debug, Error)]
pub enum RelocationError {
    /// Source and target are the same location.
    #[error("source and target are identical ({0})")]
    InvalidRequest(Location),

    /// Nothing to move.
    #[error("no stock at {0}")]
    EmptySource(Location),

    /// The target guard found entries at the target. Nothing was moved.
    #[error("target {0} is no longer empty")]
    TargetOccupied(Location),

    /// A store call failed. Batches before `committed_chunks` stay applied.
    #[error(
        "store failure after {committed_chunks} of {total_chunks} chunks \
         ({committed_entries} entries moved): {source}"
    )]
    Store {
        source: StoreError,
        committed_chunks: usize,
        total_chunks: usize,
        committed_entries: usize,
    },
}

impl RelocationError {
    /// A store failure before any batch committed.
    pub(crate) fn store(source: StoreError) -> Self {
        Self::Store {
            source,
            committed_chunks: 0,
            total_chunks: 0,
            committed_entries: 0,
        }
    }

    /// Whether some, but not all, chunks were committed.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Store { committed_chunks, .. } if *committed_chunks > 0)
    }

    /// Whether no entry was moved, so the same request can simply be
    /// retried. After a partial failure the caller must re-read occupancy
    /// first.
    pub fn retry_safe(&self) -> bool {
        !self.is_partial()
    }
}

/// Errors that can occur during Warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// Parse, resolution, or validation error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Relocation error.
    #[error("relocation failed: {0}")]
    Relocation(#[from] RelocationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Stock changes must move at least one unit.
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// Removal asked for more than the location holds.
    #[error("only {available} of {item_key} at {location}, cannot remove {requested}")]
    InsufficientStock {
        location: Location,
        item_key: ItemKey,
        available: u64,
        requested: u64,
    },
}

impl WarehouseError {
    /// Whether the operation failed before writing anything.
    pub fn retry_safe(&self) -> bool {
        match self {
            Self::Relocation(err) => err.retry_safe(),
            _ => true,
        }
    }
}

/// Result type for Warehouse operations.
pub type Result<T> = std::result::Result<T, WarehouseError>;
