//! Occupancy feed: keeps an [`OccupancyIndex`] snapshot current.
//!
//! The store bumps a revision counter on every committed write. The feed
//! reloads all entries when the revision moves and publishes a fresh,
//! immutable snapshot over a `watch` channel. Readers never see a snapshot
//! change under them; they pick up the next one when they ask.

use std::sync::Arc;

use tokio::sync::watch;

use rackslot_core::OccupancyIndex;
use rackslot_store::{Result, Store};

/// Publishes occupancy snapshots rebuilt from the store.
pub struct OccupancyFeed<S: Store + ?Sized> {
    store: Arc<S>,
    revisions: watch::Receiver<u64>,
    snapshots: watch::Sender<Arc<OccupancyIndex>>,
}

impl<S: Store + ?Sized> OccupancyFeed<S> {
    /// A feed starting from an empty snapshot. Call [`refresh`](Self::refresh)
    /// or [`run`](Self::run) to load.
    pub fn new(store: Arc<S>) -> Self {
        let revisions = store.subscribe();
        let (snapshots, _) = watch::channel(Arc::new(OccupancyIndex::new()));
        Self {
            store,
            revisions,
            snapshots,
        }
    }

    /// Receive every snapshot this feed publishes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<OccupancyIndex>> {
        self.snapshots.subscribe()
    }

    /// The latest published snapshot.
    pub fn current(&self) -> Arc<OccupancyIndex> {
        self.snapshots.borrow().clone()
    }

    /// Reload all entries and publish a new snapshot.
    pub async fn refresh(&mut self) -> Result<Arc<OccupancyIndex>> {
        // Mark the revision seen first so a write racing the reload
        // triggers another one.
        let revision = *self.revisions.borrow_and_update();
        let records = self.store.read_all_entries().await?;
        let index = Arc::new(OccupancyIndex::from_records(&records));

        if index.skipped_records() > 0 {
            tracing::warn!(
                skipped = index.skipped_records(),
                "corrupt records left out of snapshot"
            );
        }
        tracing::debug!(revision, locations = index.len(), "occupancy snapshot rebuilt");

        self.snapshots.send_replace(Arc::clone(&index));
        Ok(index)
    }

    /// Refresh on every store revision.
    ///
    /// Returns when the store stops publishing revisions or every snapshot
    /// receiver is gone.
    pub async fn run(mut self) -> Result<()> {
        loop {
            self.refresh().await?;
            tokio::select! {
                changed = self.revisions.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
                _ = self.snapshots.closed() => return Ok(()),
            }
        }
    }
}
