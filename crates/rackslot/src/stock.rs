//! Stock operations: add, remove, and list entries at one location.
//!
//! These compose with a concurrent relocation because every quantity change
//! is an increment applied by the store at commit time.

use rackslot_core::{
    classify_entry, partition_entries, EntryRecord, InventoryEntry, ItemKey, Location,
};
use rackslot_store::{now_millis, Batch, EntryPatch, LocationMeta, Store, StoreError, StoreExt};

use crate::error::{Result, WarehouseError};
use crate::warehouse::Warehouse;

fn delta(quantity: u64) -> Result<i64> {
    if quantity == 0 {
        return Err(WarehouseError::InvalidQuantity);
    }
    i64::try_from(quantity).map_err(|_| WarehouseError::InvalidQuantity)
}

fn insufficient(
    location: Location,
    item_key: &ItemKey,
    available: u64,
    requested: u64,
) -> WarehouseError {
    WarehouseError::InsufficientStock {
        location,
        item_key: item_key.clone(),
        available,
        requested,
    }
}

impl<S: Store> Warehouse<S> {
    /// Add `quantity` units of `item_key` at `location`.
    ///
    /// Creates the entry if needed and stamps its type tag, using the
    /// configured default when `item_type` is `None`.
    pub async fn add_stock(
        &self,
        location: Location,
        item_key: &ItemKey,
        quantity: u64,
        item_type: Option<&str>,
    ) -> Result<()> {
        self.check_location(&location)?;
        let delta = delta(quantity)?;
        let now = now_millis();

        self.store
            .upsert_location_meta(&LocationMeta {
                location,
                updated_at: now,
            })
            .await?;

        let patch = EntryPatch {
            item_type: Some(item_type.unwrap_or(&self.config.default_item_type).to_string()),
            created_at: Some(now),
            ..EntryPatch::increment(delta, now)
        };
        let mut batch = Batch::new();
        batch.merge_entry(location, item_key.clone(), patch);
        self.store.execute_batch(batch).await?;

        tracing::debug!(%location, item = %item_key, quantity, "stock added");
        Ok(())
    }

    /// Remove `quantity` units of `item_key` from `location`.
    ///
    /// The stock check is repeated by the store inside the write batch, so
    /// a relocation or removal committed in between cannot be undercut.
    /// Returns the quantity left as of the read before the write. The
    /// store deletes the entry once it reaches zero.
    pub async fn remove_stock(
        &self,
        location: Location,
        item_key: &ItemKey,
        quantity: u64,
    ) -> Result<u64> {
        self.check_location(&location)?;
        let delta = delta(quantity)?;

        let available = self.available(&location, item_key).await?;
        if available < quantity {
            return Err(insufficient(location, item_key, available, quantity));
        }

        let mut batch = Batch::with_capacity(2);
        batch.expect_quantity_at_least(location, item_key.clone(), quantity);
        batch.merge_entry(location, item_key.clone(), EntryPatch::increment(-delta, now_millis()));
        match self.store.execute_batch(batch).await {
            Ok(()) => {}
            Err(StoreError::PreconditionFailed(reason)) => {
                tracing::warn!(
                    %location,
                    item = %item_key,
                    %reason,
                    "stock changed before removal"
                );
                let available = self.available(&location, item_key).await?;
                return Err(insufficient(location, item_key, available, quantity));
            }
            Err(err) => return Err(err.into()),
        }

        tracing::debug!(%location, item = %item_key, quantity, "stock removed");
        Ok(available - quantity)
    }

    async fn available(&self, location: &Location, item_key: &ItemKey) -> Result<u64> {
        Ok(match self.store.read_entry(location, item_key.as_str()).await? {
            Some(raw) => match classify_entry(&raw) {
                EntryRecord::Valid(entry) => entry.quantity,
                EntryRecord::Corrupt(_) => 0,
            },
            None => 0,
        })
    }

    /// Valid entries at `location`. Corrupt records are skipped and logged.
    pub async fn entries_at(&self, location: Location) -> Result<Vec<InventoryEntry>> {
        let raws = self.store.read_entries_at(&location).await?;
        let (entries, corrupt) = partition_entries(&raws);
        for bad in &corrupt {
            tracing::warn!(
                slot = %location.slot_id(),
                doc_id = %bad.doc_id,
                reason = %bad.reason,
                "skipping corrupt entry"
            );
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WarehouseConfig;
    use rackslot_core::RawEntry;
    use rackslot_store::MemoryStore;

    fn warehouse() -> Warehouse<MemoryStore> {
        Warehouse::new(MemoryStore::new(), WarehouseConfig::default())
    }

    fn key(s: &str) -> ItemKey {
        ItemKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_add_accumulates() {
        let wh = warehouse();
        let here = Location::at(7, 3);
        wh.add_stock(here, &key("A"), 3, None).await.unwrap();
        wh.add_stock(here, &key("A"), 4, Some("box")).await.unwrap();

        let entries = wh.entries_at(here).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].quantity, 7);
        assert_eq!(entries[0].item_type, "box");
        assert!(wh.store().get_location_meta(&here).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_add_uses_default_type() {
        let wh = Warehouse::new(
            MemoryStore::new(),
            WarehouseConfig::default().with_default_item_type("pallet"),
        );
        wh.add_stock(Location::at(1, 1), &key("A"), 1, None).await.unwrap();
        let entries = wh.entries_at(Location::at(1, 1)).await.unwrap();
        assert_eq!(entries[0].item_type, "pallet");
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let wh = warehouse();
        assert!(matches!(
            wh.add_stock(Location::at(1, 1), &key("A"), 0, None).await,
            Err(WarehouseError::InvalidQuantity)
        ));
        assert!(matches!(
            wh.remove_stock(Location::at(1, 1), &key("A"), 0).await,
            Err(WarehouseError::InvalidQuantity)
        ));
    }

    #[tokio::test]
    async fn test_remove_to_zero_deletes() {
        let wh = warehouse();
        let here = Location::at(2, 1);
        wh.add_stock(here, &key("A"), 5, None).await.unwrap();

        assert_eq!(wh.remove_stock(here, &key("A"), 2).await.unwrap(), 3);
        assert_eq!(wh.remove_stock(here, &key("A"), 3).await.unwrap(), 0);
        assert!(wh.entries_at(here).await.unwrap().is_empty());
        assert!(wh.store().read_entries_at(&here).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_insufficient() {
        let wh = warehouse();
        let here = Location::at(2, 1);
        wh.add_stock(here, &key("A"), 1, None).await.unwrap();

        let err = wh.remove_stock(here, &key("A"), 2).await.unwrap_err();
        assert!(matches!(
            err,
            WarehouseError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            }
        ));
        assert_eq!(wh.entries_at(here).await.unwrap()[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_entries_at_skips_corrupt() {
        let wh = warehouse();
        let here = Location::at(3, 3);
        wh.add_stock(here, &key("ok"), 1, None).await.unwrap();
        wh.store()
            .put_raw(
                here,
                RawEntry {
                    doc_id: "bad".into(),
                    quantity: Some(-4),
                    ..Default::default()
                },
            )
            .unwrap();

        let entries = wh.entries_at(here).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item_key.as_str(), "ok");
    }
}
