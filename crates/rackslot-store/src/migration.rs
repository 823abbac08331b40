//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{current} is newer than supported v{CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, crate::now_millis()],
            )?;
            tracing::info!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Location existence markers
        CREATE TABLE locations (
            slot_id TEXT PRIMARY KEY,         -- e.g. C7_L3
            shelf INTEGER NOT NULL,
            level INTEGER NOT NULL,
            updated_at INTEGER NOT NULL       -- Unix ms
        );

        -- Inventory records, one per (location, item key)
        CREATE TABLE entries (
            slot_id TEXT NOT NULL,
            doc_id TEXT NOT NULL,             -- sanitized item key
            shelf INTEGER NOT NULL,
            level INTEGER NOT NULL,
            item_key TEXT,
            quantity,                         -- untyped: malformed values are possible and detected on read
            item_type TEXT,
            created_at INTEGER,
            updated_at INTEGER,
            last_movement TEXT,

            PRIMARY KEY (slot_id, doc_id)
        );

        CREATE INDEX idx_entries_shelf_level ON entries(shelf, level);
        "#,
    )?;

    Ok(())
}
