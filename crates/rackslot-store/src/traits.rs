//! Store trait: the abstract interface for inventory persistence.
//!
//! This trait allows the warehouse to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use rackslot_core::{Location, RawEntry};

use crate::batch::Batch;
use crate::error::Result;

/// Default per-batch write limit, matching common document stores.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;

/// Existence marker for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMeta {
    pub location: Location,
    /// Last upsert (Unix ms).
    pub updated_at: i64,
}

/// The Store trait: async interface for inventory persistence.
///
/// # Design Notes
///
/// - **Batches are the only atomic unit.** A batch is applied completely
///   or not at all; nothing spans batches.
/// - **Quantities are incremented at write time.** Merges add
///   `quantity_delta` to the committed value, so concurrent writers compose.
/// - **No non-positive quantities.** A merge that leaves a quantity at or
///   below zero deletes the record in the same batch.
/// - **Raw reads.** Entries come back as [`RawEntry`]; validation is the
///   caller's job.
#[async_trait]
pub trait Store: Send + Sync {
    /// Merge-write the location's existence marker, creating it if absent.
    async fn upsert_location_meta(&self, meta: &LocationMeta) -> Result<()>;

    /// Get a location's existence marker.
    async fn get_location_meta(&self, location: &Location) -> Result<Option<LocationMeta>>;

    /// Read every record at one location, ordered by record id.
    async fn read_entries_at(&self, location: &Location) -> Result<Vec<RawEntry>>;

    /// Read every record in the store, ordered by location then record id.
    ///
    /// This is the feed the occupancy index is rebuilt from.
    async fn read_all_entries(&self) -> Result<Vec<(Location, RawEntry)>>;

    /// Apply a batch atomically.
    ///
    /// Fails with `BatchTooLarge` if the batch exceeds
    /// [`max_batch_size`](Store::max_batch_size), and with
    /// `PreconditionFailed` if an `ExpectEmpty` or `ExpectQuantityAtLeast`
    /// does not hold. In both
    /// cases nothing is written.
    async fn execute_batch(&self, batch: Batch) -> Result<()>;

    /// Largest batch this backend accepts.
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }

    /// Revision counter, bumped once per committed write.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Read a single record at a location by its id.
    fn read_entry(
        &self,
        location: &Location,
        doc_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<RawEntry>>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn read_entry(&self, location: &Location, doc_id: &str) -> Result<Option<RawEntry>> {
        let entries = self.read_entries_at(location).await?;
        Ok(entries.into_iter().find(|e| e.doc_id == doc_id))
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn upsert_location_meta(&self, meta: &LocationMeta) -> Result<()> {
        (**self).upsert_location_meta(meta).await
    }

    async fn get_location_meta(&self, location: &Location) -> Result<Option<LocationMeta>> {
        (**self).get_location_meta(location).await
    }

    async fn read_entries_at(&self, location: &Location) -> Result<Vec<RawEntry>> {
        (**self).read_entries_at(location).await
    }

    async fn read_all_entries(&self) -> Result<Vec<(Location, RawEntry)>> {
        (**self).read_all_entries().await
    }

    async fn execute_batch(&self, batch: Batch) -> Result<()> {
        (**self).execute_batch(batch).await
    }

    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        (**self).subscribe()
    }
}
