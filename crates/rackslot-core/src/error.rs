//! Error types for rackslot core.

use thiserror::Error;

use crate::location::{Location, Shelf};

/// Errors raised by parsing, validation, and location resolution.
///
/// None of these are produced after a write has happened, so every variant
/// is safe to retry with corrected input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid location code {0:?}: expected e.g. C1 or C1-L5")]
    InvalidLocationText(String),

    #[error("invalid slot id {0:?}: expected e.g. C1_L5")]
    InvalidSlotId(String),

    #[error("shelf {0} has no stock on any level")]
    NoStockAtShelf(Shelf),

    #[error("shelf {0} is full: no empty level")]
    TargetFull(Shelf),

    #[error("item key is empty after sanitizing")]
    InvalidItemKey,

    #[error("source and target are identical ({0})")]
    InvalidRequest(Location),

    #[error("location {0} is outside the shelf grid")]
    OffGrid(Location),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
