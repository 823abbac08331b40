//! The Warehouse: unified API for rackslot.
//!
//! Brings together storage, location resolution, and relocation behind one
//! handle. Stock operations live in [`crate::stock`].

use std::sync::Arc;

use rackslot_core::{parse_location, Location, OccupancyIndex, RelocationRequest, Resolver};
use rackslot_store::Store;

use crate::config::WarehouseConfig;
use crate::error::{RelocationError, Result};
use crate::feed::OccupancyFeed;
use crate::relocate::{RelocationReport, Relocator};

/// The main Warehouse struct.
///
/// Provides a unified API for:
/// - Resolving scanned location codes against an occupancy snapshot
/// - Relocating whole slots
/// - Adding, removing, and listing stock
/// - Building and following occupancy snapshots
pub struct Warehouse<S: Store> {
    /// The storage backend.
    pub(crate) store: Arc<S>,
    /// Configuration.
    pub(crate) config: WarehouseConfig,
}

impl<S: Store> Warehouse<S> {
    /// Create a new warehouse over a store.
    pub fn new(store: S, config: WarehouseConfig) -> Self {
        Self::from_arc(Arc::new(store), config)
    }

    /// Create a warehouse over a store shared with other handles.
    pub fn from_arc(store: Arc<S>, config: WarehouseConfig) -> Self {
        Self { store, config }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Reject off-grid locations when grid enforcement is on.
    pub fn check_location(&self, location: &Location) -> Result<()> {
        if self.config.enforce_grid {
            self.config.grid.check(location)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// A resolver over `index` and this warehouse's grid.
    pub fn resolver<'a>(&self, index: &'a OccupancyIndex) -> Resolver<'a> {
        Resolver::new(&self.config.grid, index)
    }

    /// Parse scanned source text, defaulting the level to the topmost
    /// occupied one.
    pub fn resolve_source(&self, text: &str, index: &OccupancyIndex) -> Result<Location> {
        let location = self.resolver(index).source(parse_location(text)?)?;
        self.check_location(&location)?;
        Ok(location)
    }

    /// Parse scanned target text, defaulting the level to the bottommost
    /// empty one.
    pub fn resolve_target(&self, text: &str, index: &OccupancyIndex) -> Result<Location> {
        let location = self.resolver(index).target(parse_location(text)?)?;
        self.check_location(&location)?;
        Ok(location)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Relocation
    // ─────────────────────────────────────────────────────────────────────────

    /// The relocation engine bound to this warehouse's store and config.
    pub fn relocator(&self) -> Relocator<'_, S> {
        Relocator::new(self.store.as_ref(), &self.config)
    }

    /// Move everything at `source` to `target`.
    ///
    /// Identical or off-grid locations are rejected before any store call.
    pub async fn relocate(&self, source: Location, target: Location) -> Result<RelocationReport> {
        self.check_location(&source)?;
        self.check_location(&target)?;
        let request = RelocationRequest::new(source, target)
            .map_err(|_| RelocationError::InvalidRequest(source))?;
        Ok(self.relocator().relocate(&request).await?)
    }

    /// Resolve two scans against `index` and relocate.
    pub async fn relocate_from_text(
        &self,
        source: &str,
        target: &str,
        index: &OccupancyIndex,
    ) -> Result<RelocationReport> {
        let source = self.resolve_source(source, index)?;
        let target = self.resolve_target(target, index)?;
        self.relocate(source, target).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Occupancy
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a fresh occupancy snapshot from the store.
    pub async fn snapshot(&self) -> Result<OccupancyIndex> {
        let records = self.store.read_all_entries().await?;
        Ok(OccupancyIndex::from_records(&records))
    }

    /// A feed that keeps an occupancy snapshot current.
    pub fn feed(&self) -> OccupancyFeed<S> {
        OccupancyFeed::new(Arc::clone(&self.store))
    }
}
