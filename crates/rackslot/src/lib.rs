//! # rackslot
//!
//! The unified API for rackslot - inventory on a physical shelf grid with
//! whole-slot relocation.
//!
//! ## Overview
//!
//! rackslot provides a storage-agnostic library for:
//!
//! - **Resolution**: Turning scanned codes like `C7` or `C7-L3` into locations
//! - **Relocation**: Moving everything in one slot to another, in chunks
//! - **Stock**: Adding and removing quantities with write-time increments
//! - **Occupancy**: Immutable snapshots of what is stored where
//!
//! ## Key Concepts
//!
//! - **Location**: A (shelf, level) pair. Level 1 is the bottom.
//! - **Snapshot**: Resolution reads an explicit [`OccupancyIndex`], never
//!   a live global.
//! - **Chunk**: One atomic store batch. A relocation spans several and is
//!   not atomic as a whole.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rackslot::{Warehouse, WarehouseConfig};
//! use rackslot::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("rackslot.db").unwrap();
//!     let warehouse = Warehouse::new(store, WarehouseConfig::default());
//!
//!     // Resolve scans against a fresh snapshot
//!     let index = warehouse.snapshot().await.unwrap();
//!     let report = warehouse
//!         .relocate_from_text("C5", "C5-L1", &index)
//!         .await
//!         .unwrap();
//!
//!     println!("moved {} item types", report.moved_types);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `rackslot::core` - Core primitives (Location, OccupancyIndex, etc.)
//! - `rackslot::store` - Storage abstraction and SQLite

pub mod config;
pub mod error;
pub mod feed;
pub mod relocate;
pub mod stock;
pub mod warehouse;

// Re-export component crates
pub use rackslot_core as core;
pub use rackslot_store as store;

// Re-export main types for convenience
pub use config::{WarehouseConfig, DEFAULT_CHUNK_SIZE};
pub use error::{RelocationError, Result, WarehouseError};
pub use feed::OccupancyFeed;
pub use relocate::{RelocationReport, Relocator};
pub use warehouse::Warehouse;

// Re-export commonly used core types
pub use rackslot_core::{
    parse_location, Grid, InventoryEntry, ItemKey, Level, Location, OccupancyIndex,
    ParsedLocation, RelocationRequest, Shelf,
};
