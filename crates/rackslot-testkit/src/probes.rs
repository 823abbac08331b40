//! Instrumented stores for observing and disturbing the engine.
//!
//! [`ProbeStore`] wraps any [`Store`], counts calls by kind, and can inject
//! a failure or a foreign write before a chosen batch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use rackslot_core::{Location, RawEntry};
use rackslot_store::{Batch, LocationMeta, Result, Store, StoreError};

/// Call counts observed by a [`ProbeStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub reads: usize,
    pub meta_upserts: usize,
    /// Batches submitted, committed or not.
    pub batches: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.reads + self.meta_upserts + self.batches
    }
}

/// A store wrapper that counts calls and injects faults.
///
/// Batch numbers are 1-based and count batches submitted through the
/// probe. Interleaved writes go straight to the inner store and are not
/// counted.
pub struct ProbeStore<S> {
    inner: S,
    reads: AtomicUsize,
    meta_upserts: AtomicUsize,
    batches: AtomicUsize,
    fail_on_batch: Option<usize>,
    interleave: Mutex<Option<(usize, Batch)>>,
}

impl<S: Store> ProbeStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            meta_upserts: AtomicUsize::new(0),
            batches: AtomicUsize::new(0),
            fail_on_batch: None,
            interleave: Mutex::new(None),
        }
    }

    /// Fail the `n`th batch with `StoreError::Unavailable`, writing nothing.
    pub fn fail_on_batch(mut self, n: usize) -> Self {
        self.fail_on_batch = Some(n);
        self
    }

    /// Commit `foreign` directly on the inner store just before the `n`th
    /// batch, as a concurrent writer would.
    pub fn interleave_before_batch(self, n: usize, foreign: Batch) -> Self {
        if let Ok(mut slot) = self.interleave.lock() {
            *slot = Some((n, foreign));
        }
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn counts(&self) -> CallCounts {
        CallCounts {
            reads: self.reads.load(Ordering::SeqCst),
            meta_upserts: self.meta_upserts.load(Ordering::SeqCst),
            batches: self.batches.load(Ordering::SeqCst),
        }
    }

    fn take_interleave(&self, n: usize) -> Option<Batch> {
        let mut slot = self.interleave.lock().ok()?;
        if slot.as_ref().is_some_and(|(at, _)| *at == n) {
            slot.take().map(|(_, batch)| batch)
        } else {
            None
        }
    }
}

#[async_trait]
impl<S: Store> Store for ProbeStore<S> {
    async fn upsert_location_meta(&self, meta: &LocationMeta) -> Result<()> {
        self.meta_upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert_location_meta(meta).await
    }

    async fn get_location_meta(&self, location: &Location) -> Result<Option<LocationMeta>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_location_meta(location).await
    }

    async fn read_entries_at(&self, location: &Location) -> Result<Vec<RawEntry>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_entries_at(location).await
    }

    async fn read_all_entries(&self) -> Result<Vec<(Location, RawEntry)>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_all_entries().await
    }

    async fn execute_batch(&self, batch: Batch) -> Result<()> {
        let n = self.batches.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(foreign) = self.take_interleave(n) {
            self.inner.execute_batch(foreign).await?;
        }
        if self.fail_on_batch == Some(n) {
            return Err(StoreError::Unavailable(format!("injected failure on batch {n}")));
        }
        self.inner.execute_batch(batch).await
    }

    fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::key;
    use rackslot_store::{EntryPatch, MemoryStore};

    fn one_merge(location: Location, delta: i64) -> Batch {
        let mut batch = Batch::new();
        batch.merge_entry(location, key("X"), EntryPatch::increment(delta, 1));
        batch
    }

    #[tokio::test]
    async fn test_counts_calls() {
        let probe = ProbeStore::new(MemoryStore::new());
        probe.read_entries_at(&Location::at(1, 1)).await.unwrap();
        probe.execute_batch(one_merge(Location::at(1, 1), 1)).await.unwrap();

        let counts = probe.counts();
        assert_eq!(counts.reads, 1);
        assert_eq!(counts.batches, 1);
        assert_eq!(counts.total(), 2);
    }

    #[tokio::test]
    async fn test_fail_on_batch() {
        let probe = ProbeStore::new(MemoryStore::new()).fail_on_batch(2);
        probe.execute_batch(one_merge(Location::at(1, 1), 1)).await.unwrap();
        let result = probe.execute_batch(one_merge(Location::at(1, 1), 1)).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        let entries = probe.inner().read_entries_at(&Location::at(1, 1)).await.unwrap();
        assert_eq!(entries[0].quantity, Some(1));
    }

    #[tokio::test]
    async fn test_interleave() {
        let here = Location::at(2, 2);
        let probe =
            ProbeStore::new(MemoryStore::new()).interleave_before_batch(1, one_merge(here, 10));
        probe.execute_batch(one_merge(here, 1)).await.unwrap();

        let entries = probe.inner().read_entries_at(&here).await.unwrap();
        assert_eq!(entries[0].quantity, Some(11));
    }
}
