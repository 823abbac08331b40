//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. Each batch runs in
//! one SQLite transaction.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tokio::sync::watch;

use rackslot_core::{Location, RawEntry};

use crate::batch::{apply_increment, holds_at_least, Batch, WriteOp};
use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{LocationMeta, Store, DEFAULT_MAX_BATCH_SIZE};

const ENTRY_COLUMNS: &str = "shelf, level, doc_id, item_key, quantity, item_type, created_at, updated_at, last_movement";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    revision: watch::Sender<u64>,
    max_batch_size: usize,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        migration::migrate(&mut conn)?;
        let (revision, _) = watch::channel(0);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            revision,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        })
    }

    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max.max(1);
        self
    }

    /// Write a record verbatim, bypassing batch semantics.
    ///
    /// A `None` quantity is stored as the text `'n/a'` so the record reads
    /// back as malformed.
    pub async fn put_raw(&self, location: Location, raw: RawEntry) -> Result<()> {
        self.blocking(move |conn| {
            let quantity = match raw.quantity {
                Some(q) => Value::Integer(q),
                None => Value::Text("n/a".into()),
            };
            conn.execute(
                "INSERT OR REPLACE INTO entries (slot_id, shelf, level, doc_id, item_key, quantity,
                    item_type, created_at, updated_at, last_movement)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    location.slot_id(),
                    location.shelf.number(),
                    location.level.get(),
                    raw.doc_id,
                    raw.item_key,
                    quantity,
                    raw.item_type,
                    raw.created_at,
                    raw.updated_at,
                    raw.last_movement,
                ],
            )?;
            Ok(())
        })
        .await?;
        self.bump();
        Ok(())
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

// Helper to convert a row to (Location, RawEntry).
//
// Quantity is read untyped: anything but an integer is malformed.
fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Location, RawEntry)> {
    let location = Location::at(row.get("shelf")?, row.get("level")?);
    let quantity = integer(row.get("quantity")?);

    Ok((
        location,
        RawEntry {
            doc_id: row.get("doc_id")?,
            item_key: row.get("item_key")?,
            quantity,
            item_type: row.get("item_type")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            last_movement: row.get("last_movement")?,
        },
    ))
}

fn integer(value: Value) -> Option<i64> {
    match value {
        Value::Integer(q) => Some(q),
        _ => None,
    }
}

// The stored quantity of one record; `None` if missing or not an integer.
fn current_quantity(
    tx: &Transaction<'_>,
    slot_id: &str,
    doc_id: &str,
) -> Result<Option<i64>> {
    let value = tx
        .query_row(
            "SELECT quantity FROM entries WHERE slot_id = ?1 AND doc_id = ?2",
            params![slot_id, doc_id],
            |row| row.get::<_, Value>(0),
        )
        .optional()?;
    Ok(value.and_then(integer))
}

// Why `op` does not hold, if it doesn't.
fn violation(tx: &Transaction<'_>, op: &WriteOp) -> Result<Option<String>> {
    match op {
        WriteOp::ExpectEmpty(location) => {
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM entries WHERE slot_id = ?1",
                params![location.slot_id()],
                |row| row.get(0),
            )?;
            Ok((count > 0).then(|| format!("{} is not empty", location.slot_id())))
        }
        WriteOp::ExpectQuantityAtLeast {
            location,
            item_key,
            min,
        } => {
            let current = current_quantity(tx, &location.slot_id(), item_key.as_str())?;
            Ok((!holds_at_least(current, *min)).then(|| {
                format!("{} holds fewer than {min} of {item_key}", location.slot_id())
            }))
        }
        _ => Ok(None),
    }
}

fn apply_op(tx: &Transaction<'_>, op: &WriteOp) -> Result<()> {
    match op {
        WriteOp::MergeEntry {
            location,
            item_key,
            patch,
        } => {
            let slot_id = location.slot_id();
            let current = current_quantity(tx, &slot_id, item_key.as_str())?;
            let quantity = apply_increment(current, patch.quantity_delta);
            if quantity <= 0 {
                tx.execute(
                    "DELETE FROM entries WHERE slot_id = ?1 AND doc_id = ?2",
                    params![slot_id, item_key.as_str()],
                )?;
                return Ok(());
            }
            tx.execute(
                "INSERT INTO entries (slot_id, shelf, level, doc_id, item_key, quantity,
                    item_type, created_at, updated_at, last_movement)
                 VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(slot_id, doc_id) DO UPDATE SET
                    item_key = excluded.item_key,
                    quantity = excluded.quantity,
                    item_type = COALESCE(excluded.item_type, entries.item_type),
                    created_at = COALESCE(entries.created_at, excluded.created_at),
                    updated_at = excluded.updated_at,
                    last_movement = COALESCE(excluded.last_movement, entries.last_movement)",
                params![
                    slot_id,
                    location.shelf.number(),
                    location.level.get(),
                    item_key.as_str(),
                    quantity,
                    patch.item_type,
                    patch.created_at,
                    patch.updated_at,
                    patch.last_movement,
                ],
            )?;
        }
        WriteOp::DeleteEntry { location, doc_id } => {
            tx.execute(
                "DELETE FROM entries WHERE slot_id = ?1 AND doc_id = ?2",
                params![location.slot_id(), doc_id],
            )?;
        }
        WriteOp::ExpectEmpty(_) | WriteOp::ExpectQuantityAtLeast { .. } => {}
    }
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_location_meta(&self, meta: &LocationMeta) -> Result<()> {
        let meta = meta.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO locations (slot_id, shelf, level, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(slot_id) DO UPDATE SET updated_at = excluded.updated_at",
                params![
                    meta.location.slot_id(),
                    meta.location.shelf.number(),
                    meta.location.level.get(),
                    meta.updated_at,
                ],
            )?;
            Ok(())
        })
        .await?;
        self.bump();
        Ok(())
    }

    async fn get_location_meta(&self, location: &Location) -> Result<Option<LocationMeta>> {
        let location = *location;
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT updated_at FROM locations WHERE slot_id = ?1",
                params![location.slot_id()],
                |row| {
                    Ok(LocationMeta {
                        location,
                        updated_at: row.get(0)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn read_entries_at(&self, location: &Location) -> Result<Vec<RawEntry>> {
        let location = *location;
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM entries WHERE slot_id = ?1 ORDER BY doc_id"
            ))?;
            let rows = stmt.query_map(params![location.slot_id()], row_to_entry)?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?.1);
            }
            Ok(entries)
        })
        .await
    }

    async fn read_all_entries(&self) -> Result<Vec<(Location, RawEntry)>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY shelf, level, doc_id"
            ))?;
            let rows = stmt.query_map([], row_to_entry)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(StoreError::from)
        })
        .await
    }

    async fn execute_batch(&self, batch: Batch) -> Result<()> {
        if batch.len() > self.max_batch_size {
            return Err(StoreError::BatchTooLarge {
                len: batch.len(),
                max: self.max_batch_size,
            });
        }

        let len = batch.len();
        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            for op in batch.preconditions() {
                if let Some(reason) = violation(&tx, op)? {
                    // Dropping the transaction rolls it back.
                    tracing::debug!(%reason, "batch rejected");
                    return Err(StoreError::PreconditionFailed(reason));
                }
            }

            for op in batch.ops() {
                apply_op(&tx, op)?;
            }

            tx.commit()?;
            Ok(())
        })
        .await?;

        self.bump();
        tracing::debug!(ops = len, "sqlite batch committed");
        Ok(())
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::EntryPatch;
    use rackslot_core::ItemKey;

    fn key(s: &str) -> ItemKey {
        ItemKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_merge_and_read() {
        let store = SqliteStore::open_memory().unwrap();
        let here = Location::at(3, 2);

        let mut patch = EntryPatch::increment(4, 1000);
        patch.item_type = Some("box".into());
        patch.created_at = Some(900);
        let mut batch = Batch::new();
        batch.merge_entry(here, key("A"), patch);
        store.execute_batch(batch).await.unwrap();

        let mut batch = Batch::new();
        batch.merge_entry(here, key("A"), EntryPatch::increment(1, 2000));
        store.execute_batch(batch).await.unwrap();

        let entries = store.read_entries_at(&here).await.unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.quantity, Some(5));
        assert_eq!(entry.item_type.as_deref(), Some("box"));
        assert_eq!(entry.created_at, Some(900));
        assert_eq!(entry.updated_at, Some(2000));
    }

    #[tokio::test]
    async fn test_malformed_quantity_reads_as_none() {
        let store = SqliteStore::open_memory().unwrap();
        let here = Location::at(1, 1);
        store
            .put_raw(
                here,
                RawEntry {
                    doc_id: "bad".into(),
                    item_key: Some("bad".into()),
                    quantity: None,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let entries = store.read_entries_at(&here).await.unwrap();
        assert_eq!(entries[0].quantity, None);

        // An increment on a malformed value starts from zero.
        let mut batch = Batch::new();
        batch.merge_entry(here, key("bad"), EntryPatch::increment(2, 1));
        store.execute_batch(batch).await.unwrap();
        let entries = store.read_entries_at(&here).await.unwrap();
        assert_eq!(entries[0].quantity, Some(2));
    }

    #[tokio::test]
    async fn test_decrement_to_zero_deletes() {
        let store = SqliteStore::open_memory().unwrap();
        let here = Location::at(1, 1);

        let mut batch = Batch::new();
        batch.merge_entry(here, key("A"), EntryPatch::increment(2, 1));
        store.execute_batch(batch).await.unwrap();
        let mut batch = Batch::new();
        batch.merge_entry(here, key("A"), EntryPatch::increment(-2, 2));
        store.execute_batch(batch).await.unwrap();

        assert!(store.read_entries_at(&here).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_precondition_rolls_back() {
        let store = SqliteStore::open_memory().unwrap();
        let occupied = Location::at(1, 1);
        let other = Location::at(1, 2);

        let mut batch = Batch::new();
        batch.merge_entry(occupied, key("A"), EntryPatch::increment(1, 1));
        store.execute_batch(batch).await.unwrap();

        let mut batch = Batch::new();
        batch.expect_empty(occupied);
        batch.merge_entry(other, key("B"), EntryPatch::increment(1, 1));
        batch.delete_entry(occupied, "A");
        let result = store.execute_batch(batch).await;

        assert!(matches!(result, Err(StoreError::PreconditionFailed(_))));
        assert_eq!(store.read_entries_at(&occupied).await.unwrap().len(), 1);
        assert!(store.read_entries_at(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expect_quantity_rolls_back() {
        let store = SqliteStore::open_memory().unwrap();
        let here = Location::at(7, 4);

        let mut batch = Batch::new();
        batch.merge_entry(here, key("A"), EntryPatch::increment(5, 1));
        store.execute_batch(batch).await.unwrap();

        let mut batch = Batch::new();
        batch.expect_quantity_at_least(here, key("A"), 6);
        batch.merge_entry(here, key("A"), EntryPatch::increment(-6, 2));
        let result = store.execute_batch(batch).await;
        assert!(matches!(result, Err(StoreError::PreconditionFailed(_))));
        assert_eq!(store.read_entries_at(&here).await.unwrap()[0].quantity, Some(5));

        let mut batch = Batch::new();
        batch.expect_quantity_at_least(here, key("A"), 5);
        batch.merge_entry(here, key("A"), EntryPatch::increment(-5, 3));
        store.execute_batch(batch).await.unwrap();
        assert!(store.read_entries_at(&here).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_saturates_like_memory() {
        let store = SqliteStore::open_memory().unwrap();
        let here = Location::at(1, 1);
        for delta in [i64::MAX - 1, 5] {
            let mut batch = Batch::new();
            batch.merge_entry(here, key("X"), EntryPatch::increment(delta, 1));
            store.execute_batch(batch).await.unwrap();
        }

        let entries = store.read_entries_at(&here).await.unwrap();
        assert_eq!(entries[0].quantity, Some(i64::MAX));
    }

    #[tokio::test]
    async fn test_read_all_ordered() {
        let store = SqliteStore::open_memory().unwrap();
        let mut batch = Batch::new();
        batch.merge_entry(Location::at(2, 1), key("B"), EntryPatch::increment(1, 1));
        batch.merge_entry(Location::at(1, 5), key("Z"), EntryPatch::increment(1, 1));
        batch.merge_entry(Location::at(1, 5), key("A"), EntryPatch::increment(1, 1));
        store.execute_batch(batch).await.unwrap();

        let all = store.read_all_entries().await.unwrap();
        let order: Vec<_> = all
            .iter()
            .map(|(l, e)| (l.slot_id(), e.doc_id.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("C1_L5".to_string(), "A".to_string()),
                ("C1_L5".to_string(), "Z".to_string()),
                ("C2_L1".to_string(), "B".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rackslot.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .upsert_location_meta(&LocationMeta {
                    location: Location::at(7, 3),
                    updated_at: 42,
                })
                .await
                .unwrap();
            let mut batch = Batch::new();
            batch.merge_entry(Location::at(7, 3), key("A"), EntryPatch::increment(3, 42));
            store.execute_batch(batch).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let meta = store.get_location_meta(&Location::at(7, 3)).await.unwrap();
        assert_eq!(meta.map(|m| m.updated_at), Some(42));
        assert_eq!(store.read_entries_at(&Location::at(7, 3)).await.unwrap()[0].quantity, Some(3));
    }
}
