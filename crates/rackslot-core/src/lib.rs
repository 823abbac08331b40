//! # rackslot Core
//!
//! Pure primitives for rackslot: locations, inventory entries, occupancy
//! snapshots, and location resolution.
//!
//! This crate contains no I/O and no storage. It is pure computation over
//! the shelf grid.
//!
//! ## Key Types
//!
//! - [`Location`] - A (shelf, level) slot, persisted as `C7_L3`
//! - [`ParsedLocation`] - Operator input whose level may be omitted
//! - [`InventoryEntry`] - One item type's positive quantity at a location
//! - [`RawEntry`] - An unvalidated store record
//! - [`OccupancyIndex`] - Immutable snapshot of entries per location
//! - [`Resolver`] - Fills in omitted levels from a snapshot
//!
//! ## Resolution Policy
//!
//! Sources default to the topmost occupied level; targets default to the
//! bottommost empty level. See [`resolver`].

pub mod entry;
pub mod error;
pub mod location;
pub mod occupancy;
pub mod resolver;
pub mod types;
pub mod validation;

pub use entry::{InventoryEntry, RawEntry, DEFAULT_ITEM_TYPE};
pub use error::{CoreError, Result};
pub use location::{parse_location, Level, Location, ParsedLocation, RelocationRequest, Shelf};
pub use occupancy::{OccupancyIndex, SlotStats};
pub use resolver::{resolve_source, resolve_target, Resolver};
pub use types::{sanitize_key, Grid, ItemKey};
pub use validation::{classify_entry, partition_entries, CorruptEntry, CorruptReason, EntryRecord};
