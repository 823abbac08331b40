//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use anyhow::Context;

use rackslot::{ItemKey, Location, Warehouse, WarehouseConfig};
use rackslot_core::OccupancyIndex;
use rackslot_store::{MemoryStore, SqliteStore, Store, StoreExt};

/// Install a test-writer tracing subscriber, once per process.
///
/// Honors `RUST_LOG`; defaults to `rackslot=debug`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rackslot=debug,rackslot_store=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Shorthand for a valid item key.
pub fn key(raw: &str) -> ItemKey {
    ItemKey::new(raw).unwrap_or_else(|e| panic!("bad test key {raw:?}: {e}"))
}

/// A warehouse over a store, with helpers to seed and inspect stock.
pub struct TestFixture<S: Store = MemoryStore> {
    pub warehouse: Warehouse<S>,
}

impl TestFixture<MemoryStore> {
    /// Create a fixture over a fresh memory store.
    pub fn new() -> Self {
        Self::with_config(WarehouseConfig::default())
    }

    pub fn with_config(config: WarehouseConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }
}

impl TestFixture<SqliteStore> {
    /// Create a fixture over an in-memory SQLite database.
    pub fn sqlite() -> anyhow::Result<Self> {
        let store = SqliteStore::open_memory().context("open sqlite")?;
        Ok(Self::with_store(store, WarehouseConfig::default()))
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> TestFixture<S> {
    pub fn with_store(store: S, config: WarehouseConfig) -> Self {
        Self {
            warehouse: Warehouse::new(store, config),
        }
    }

    pub fn store(&self) -> &S {
        self.warehouse.store()
    }

    /// Add stock at a location.
    pub async fn stock(&self, location: Location, item: &str, quantity: u64) -> anyhow::Result<()> {
        self.warehouse
            .add_stock(location, &key(item), quantity, None)
            .await
            .with_context(|| format!("stock {quantity} x {item} at {location}"))
    }

    /// Shelf C5 with two item types on level 4 and one on level 2. Levels
    /// 1, 3 and 5 stay empty.
    pub async fn seed_shelf_c5(&self) -> anyhow::Result<()> {
        self.stock(Location::at(5, 4), "A-100", 3).await?;
        self.stock(Location::at(5, 4), "B-200", 2).await?;
        self.stock(Location::at(5, 2), "C-300", 1).await?;
        Ok(())
    }

    /// Quantity of one item at one location, zero if absent.
    pub async fn quantity_at(&self, location: Location, item: &str) -> anyhow::Result<u64> {
        let raw = self.store().read_entry(&location, key(item).as_str()).await?;
        Ok(raw
            .and_then(|r| r.quantity)
            .and_then(|q| u64::try_from(q).ok())
            .unwrap_or(0))
    }

    /// A fresh snapshot of the whole store.
    pub async fn snapshot(&self) -> anyhow::Result<OccupancyIndex> {
        Ok(self.warehouse.snapshot().await?)
    }

    /// Units stored across the whole warehouse.
    pub async fn total_quantity(&self) -> anyhow::Result<u64> {
        Ok(self.snapshot().await?.total_quantity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_shelf_c5() {
        let fixture = TestFixture::new();
        fixture.seed_shelf_c5().await.unwrap();

        let index = fixture.snapshot().await.unwrap();
        assert_eq!(index.entries_at(&Location::at(5, 4)).len(), 2);
        assert_eq!(fixture.total_quantity().await.unwrap(), 6);
        assert_eq!(fixture.quantity_at(Location::at(5, 4), "A-100").await.unwrap(), 3);
        assert_eq!(fixture.quantity_at(Location::at(5, 1), "A-100").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sqlite_fixture() {
        let fixture = TestFixture::sqlite().unwrap();
        fixture.seed_shelf_c5().await.unwrap();
        assert_eq!(fixture.total_quantity().await.unwrap(), 6);
    }
}
