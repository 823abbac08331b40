//! # rackslot Testkit
//!
//! Testing utilities for rackslot.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A warehouse over a memory or SQLite store, with seeding helpers
//! - **Generators**: Proptest strategies for location text and slot contents
//! - **Probes**: A store wrapper that counts calls and injects faults
//!
//! The cross-crate integration tests live under `tests/`.
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use rackslot_testkit::generators::location_text;
//!
//! proptest! {
//!     #[test]
//!     fn any_spelling_parses((text, shelf, level) in location_text()) {
//!         let parsed = rackslot::parse_location(&text).unwrap();
//!         prop_assert_eq!(parsed.shelf.number(), shelf);
//!         prop_assert_eq!(parsed.level.map(|l| l.get()), level);
//!     }
//! }
//! ```
//!
//! ## Probes
//!
//! Observe or disturb the engine:
//!
//! ```rust
//! use rackslot_store::MemoryStore;
//! use rackslot_testkit::probes::ProbeStore;
//!
//! let probe = ProbeStore::new(MemoryStore::new()).fail_on_batch(2);
//! assert_eq!(probe.counts().total(), 0);
//! ```

pub mod fixtures;
pub mod generators;
pub mod probes;

pub use fixtures::{init_tracing, key, TestFixture};
pub use probes::{CallCounts, ProbeStore};
