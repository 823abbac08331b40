//! # rackslot Store
//!
//! Storage abstraction for rackslot. Provides a trait-based interface for
//! inventory persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts entry storage behind the [`Store`] trait,
//! allowing the warehouse to be storage-agnostic. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`Batch`] / [`WriteOp`] - All-or-nothing groups of writes
//! - [`EntryPatch`] - Merge-write fields, with an increment for quantity
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rackslot_store::{Batch, EntryPatch, SqliteStore, Store};
//! use rackslot_core::{ItemKey, Location};
//!
//! async fn example() {
//!     let store = SqliteStore::open("rackslot.db").unwrap();
//!
//!     let mut batch = Batch::new();
//!     batch.merge_entry(
//!         Location::at(7, 3),
//!         ItemKey::new("A-100").unwrap(),
//!         EntryPatch::increment(5, 1_700_000_000_000),
//!     );
//!     store.execute_batch(batch).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Batch atomicity only**: nothing spans two batches
//! - **Increment merges**: quantity deltas are applied at commit time
//! - **Positive quantities**: records merged to zero or below are deleted
//! - **Raw reads**: malformed fields are surfaced as `None`, never coerced

pub mod batch;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use batch::{apply_increment, Batch, EntryPatch, WriteOp};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{LocationMeta, Store, StoreExt, DEFAULT_MAX_BATCH_SIZE};

/// Current time in milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
