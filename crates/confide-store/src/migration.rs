//! Database schema migrations for SQLite.
//!
//! Simple versioned migration system: each migration is a SQL batch that
//! transforms the schema from version N to N+1.

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

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
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
        -- Line directory. AUTOINCREMENT keeps handles monotonic and
        -- never reused, even across deletes that the API does not offer.
        CREATE TABLE lines (
            line_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            creator BLOB NOT NULL,            -- 32 bytes
            created_at INTEGER NOT NULL       -- Unix ms
        );

        -- Membership registry. One row per (line, identity); rows are
        -- only ever inserted.
        CREATE TABLE members (
            line_id INTEGER NOT NULL REFERENCES lines(line_id),
            identity BLOB NOT NULL,           -- 32 bytes
            joined_at INTEGER NOT NULL,       -- Unix ms
            PRIMARY KEY (line_id, identity)
        );

        -- Message ledger. seq is zero-based and contiguous per line.
        CREATE TABLE messages (
            line_id INTEGER NOT NULL REFERENCES lines(line_id),
            seq INTEGER NOT NULL,
            sender BLOB NOT NULL,             -- 32 bytes
            timestamp INTEGER NOT NULL,       -- Unix ms
            ciphertext BLOB NOT NULL,         -- opaque, non-empty
            PRIMARY KEY (line_id, seq)
        );

        -- Secret handles. One per line, created in the same transaction
        -- as the line row; no two lines share a handle.
        CREATE TABLE secrets (
            line_id INTEGER PRIMARY KEY REFERENCES lines(line_id),
            handle BLOB NOT NULL UNIQUE       -- 32 bytes, opaque
        );

        -- Capability grant audit set. Mirrors membership; rows are only
        -- ever inserted.
        CREATE TABLE capability_grants (
            line_id INTEGER NOT NULL REFERENCES lines(line_id),
            identity BLOB NOT NULL,           -- 32 bytes
            granted_at INTEGER NOT NULL,      -- Unix ms
            PRIMARY KEY (line_id, identity)
        );

        -- Indexes for common queries
        CREATE INDEX idx_members_identity ON members(identity);
        CREATE INDEX idx_messages_timestamp ON messages(timestamp);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
