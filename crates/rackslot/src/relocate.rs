//! Whole-slot relocation.
//!
//! Moves every entry at a source location to a target location. The move
//! is split into chunks, one store batch each, committed in order. Each
//! batch is atomic; the relocation as a whole is not. A failure leaves the
//! earlier chunks applied and reports how many there were.
//!
//! Target quantities are never overwritten. Every moved entry is merged
//! into the target with an increment, so stock added to the target by
//! another writer while the relocation runs is kept.

use serde::Serialize;

use rackslot_core::{classify_entry, EntryRecord, Location, RelocationRequest};
use rackslot_store::{now_millis, Batch, EntryPatch, LocationMeta, Store, StoreError};

use crate::config::WarehouseConfig;
use crate::error::RelocationError;

/// Outcome of a completed relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelocationReport {
    pub source: Location,
    pub target: Location,
    /// Source entries processed, corrupt ones included. Counts item types,
    /// not units.
    pub moved_types: usize,
    /// Units merged into the target.
    pub moved_quantity: u64,
    /// Corrupt source entries deleted instead of moved.
    pub corrupt_removed: usize,
    /// Batches committed.
    pub chunks: usize,
}

/// The relocation engine, borrowing a store and its configuration.
pub struct Relocator<'a, S: Store + ?Sized> {
    store: &'a S,
    config: &'a WarehouseConfig,
}

impl<'a, S: Store + ?Sized> Relocator<'a, S> {
    pub fn new(store: &'a S, config: &'a WarehouseConfig) -> Self {
        Self { store, config }
    }

    /// Writes in the first batch beyond those of its entries.
    fn guard_ops(&self) -> usize {
        usize::from(self.config.guard_empty_target)
    }

    /// Source entries per batch, or `None` if not even one fits.
    ///
    /// A moved entry costs two writes (merge at the target, delete at the
    /// source) and the target guard one more, all of which must fit in the
    /// store's batch limit.
    pub fn chunk_size(&self) -> Option<usize> {
        let budget = self.store.max_batch_size().saturating_sub(self.guard_ops()) / 2;
        match self.config.chunk_size.max(1).min(budget) {
            0 => None,
            size => Some(size),
        }
    }

    /// Relocate everything at `request.source()` to `request.target()`.
    ///
    /// Does not consult any occupancy snapshot: the source is read fresh
    /// from the store. Retrying after success fails with `EmptySource`.
    pub async fn relocate(
        &self,
        request: &RelocationRequest,
    ) -> Result<RelocationReport, RelocationError> {
        let source = request.source();
        let target = request.target();

        let Some(chunk_size) = self.chunk_size() else {
            let max = self.store.max_batch_size();
            tracing::error!(%source, %target, max, "store batch limit too small to relocate");
            return Err(RelocationError::store(StoreError::BatchTooLarge {
                len: 2 + self.guard_ops(),
                max,
            }));
        };

        let raws = self
            .store
            .read_entries_at(&source)
            .await
            .map_err(RelocationError::store)?;
        if raws.is_empty() {
            tracing::debug!(%source, "nothing to relocate");
            return Err(RelocationError::EmptySource(source));
        }

        let now = now_millis();
        self.store
            .upsert_location_meta(&LocationMeta {
                location: target,
                updated_at: now,
            })
            .await
            .map_err(RelocationError::store)?;

        let total_chunks = raws.len().div_ceil(chunk_size);
        let movement = format!("moved from {}", source.slot_id());
        tracing::info!(
            %source,
            %target,
            entries = raws.len(),
            chunks = total_chunks,
            "relocating slot"
        );

        let mut report = RelocationReport {
            source,
            target,
            moved_types: raws.len(),
            moved_quantity: 0,
            corrupt_removed: 0,
            chunks: 0,
        };
        let mut committed_entries = 0;

        for (index, chunk) in raws.chunks(chunk_size).enumerate() {
            let guarded = index == 0 && self.config.guard_empty_target;
            let mut batch = Batch::with_capacity(chunk.len() * 2 + usize::from(guarded));
            if guarded {
                batch.expect_empty(target);
            }

            let mut quantity = 0u64;
            let mut corrupt = 0;
            for raw in chunk {
                match classify_entry(raw) {
                    EntryRecord::Valid(entry) => {
                        quantity = quantity.saturating_add(entry.quantity);
                        let patch = EntryPatch {
                            quantity_delta: i64::try_from(entry.quantity).unwrap_or(i64::MAX),
                            item_type: Some(entry.item_type),
                            created_at: Some(entry.created_at.unwrap_or(now)),
                            updated_at: now,
                            last_movement: Some(movement.clone()),
                        };
                        batch.merge_entry(target, entry.item_key, patch);
                    }
                    EntryRecord::Corrupt(bad) => {
                        tracing::warn!(
                            slot = %source.slot_id(),
                            doc_id = %bad.doc_id,
                            reason = %bad.reason,
                            "deleting corrupt entry"
                        );
                        corrupt += 1;
                    }
                }
                batch.delete_entry(source, raw.doc_id.clone());
            }

            match self.store.execute_batch(batch).await {
                Ok(()) => {}
                Err(StoreError::PreconditionFailed(reason)) if guarded => {
                    tracing::warn!(%target, %reason, "target filled before relocation");
                    return Err(RelocationError::TargetOccupied(target));
                }
                Err(err) => {
                    tracing::error!(
                        %source,
                        %target,
                        committed_chunks = index,
                        total_chunks,
                        error = %err,
                        "relocation aborted"
                    );
                    return Err(RelocationError::Store {
                        source: err,
                        committed_chunks: index,
                        total_chunks,
                        committed_entries,
                    });
                }
            }

            committed_entries += chunk.len();
            report.chunks += 1;
            report.moved_quantity = report.moved_quantity.saturating_add(quantity);
            report.corrupt_removed += corrupt;
            tracing::debug!(chunk = index + 1, of = total_chunks, "chunk committed");
        }

        tracing::info!(
            %source,
            %target,
            moved = report.moved_types,
            quantity = report.moved_quantity,
            "relocation complete"
        );
        Ok(report)
    }
}
