//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use rackslot_core::{Location, RawEntry};

use crate::batch::{apply_increment, holds_at_least, Batch, WriteOp};
use crate::error::{Result, StoreError};
use crate::traits::{LocationMeta, Store, DEFAULT_MAX_BATCH_SIZE};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; a
/// batch is applied under a single write guard.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
    revision: watch::Sender<u64>,
    max_batch_size: usize,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Location existence markers.
    meta: BTreeMap<Location, LocationMeta>,

    /// Records per location, keyed by record id.
    entries: BTreeMap<Location, BTreeMap<String, RawEntry>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
            revision,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    /// Lower the per-batch limit, e.g. to exercise chunking in tests.
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max.max(1);
        self
    }

    /// Write a record verbatim, bypassing batch semantics.
    ///
    /// Lets tests plant records a well-behaved writer would never produce.
    pub fn put_raw(&self, location: Location, raw: RawEntry) -> Result<()> {
        let mut inner = self.write()?;
        inner
            .entries
            .entry(location)
            .or_default()
            .insert(raw.doc_id.clone(), raw);
        drop(inner);
        self.bump();
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn occupied(&self, location: &Location) -> bool {
        self.entries.get(location).is_some_and(|e| !e.is_empty())
    }

    fn quantity(&self, location: &Location, doc_id: &str) -> Option<i64> {
        self.entries.get(location)?.get(doc_id)?.quantity
    }

    /// Why `op` does not hold, if it doesn't.
    fn violation(&self, op: &WriteOp) -> Option<String> {
        match op {
            WriteOp::ExpectEmpty(location) if self.occupied(location) => {
                Some(format!("{} is not empty", location.slot_id()))
            }
            WriteOp::ExpectQuantityAtLeast {
                location,
                item_key,
                min,
            } if !holds_at_least(self.quantity(location, item_key.as_str()), *min) => Some(
                format!("{} holds fewer than {min} of {item_key}", location.slot_id()),
            ),
            _ => None,
        }
    }

    fn apply(&mut self, op: WriteOp) {
        match op {
            WriteOp::MergeEntry {
                location,
                item_key,
                patch,
            } => {
                let records = self.entries.entry(location).or_default();
                let doc_id = item_key.as_str().to_string();
                let record = records.entry(doc_id.clone()).or_insert_with(|| RawEntry {
                    doc_id: doc_id.clone(),
                    ..Default::default()
                });

                let quantity = apply_increment(record.quantity, patch.quantity_delta);
                record.item_key = Some(doc_id.clone());
                record.quantity = Some(quantity);
                if patch.item_type.is_some() {
                    record.item_type = patch.item_type;
                }
                if record.created_at.is_none() {
                    record.created_at = patch.created_at;
                }
                record.updated_at = Some(patch.updated_at);
                if patch.last_movement.is_some() {
                    record.last_movement = patch.last_movement;
                }

                if quantity <= 0 {
                    records.remove(&doc_id);
                }
                if records.is_empty() {
                    self.entries.remove(&location);
                }
            }
            WriteOp::DeleteEntry { location, doc_id } => {
                if let Some(records) = self.entries.get_mut(&location) {
                    records.remove(&doc_id);
                    if records.is_empty() {
                        self.entries.remove(&location);
                    }
                }
            }
            WriteOp::ExpectEmpty(_) | WriteOp::ExpectQuantityAtLeast { .. } => {}
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_location_meta(&self, meta: &LocationMeta) -> Result<()> {
        let mut inner = self.write()?;
        inner.meta.insert(meta.location, meta.clone());
        drop(inner);
        self.bump();
        Ok(())
    }

    async fn get_location_meta(&self, location: &Location) -> Result<Option<LocationMeta>> {
        let inner = self.read()?;
        Ok(inner.meta.get(location).cloned())
    }

    async fn read_entries_at(&self, location: &Location) -> Result<Vec<RawEntry>> {
        let inner = self.read()?;
        Ok(inner
            .entries
            .get(location)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn read_all_entries(&self) -> Result<Vec<(Location, RawEntry)>> {
        let inner = self.read()?;
        Ok(inner
            .entries
            .iter()
            .flat_map(|(location, records)| records.values().map(|r| (*location, r.clone())))
            .collect())
    }

    async fn execute_batch(&self, batch: Batch) -> Result<()> {
        if batch.len() > self.max_batch_size {
            return Err(StoreError::BatchTooLarge {
                len: batch.len(),
                max: self.max_batch_size,
            });
        }

        let mut inner = self.write()?;

        // Check every condition before the first write.
        if let Some(reason) = batch.preconditions().find_map(|op| inner.violation(op)) {
            tracing::debug!(%reason, "batch rejected");
            return Err(StoreError::PreconditionFailed(reason));
        }

        let len = batch.len();
        for op in batch {
            inner.apply(op);
        }
        drop(inner);

        self.bump();
        tracing::trace!(ops = len, "memory batch committed");
        Ok(())
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
