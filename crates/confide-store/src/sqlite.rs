//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. The connection
//! mutex is the critical section that serializes mutations; line
//! creation runs in a transaction so the line row, its secret handle,
//! and the creator's membership commit together or not at all.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use confide_core::{
    validate_ciphertext, validate_line_name, AccessError, Identity, LineId, LineMetadata, Message,
    MessageId, SecretHandle,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{NewLine, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!("sqlite store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| StoreError::Background(format!("connection mutex poisoned: {e}")))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Background(format!("blocking task failed: {e}")))?
    }
}

/// Fail with `LineNotFound` unless the line exists.
fn require_line(conn: &Connection, id: LineId) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM lines WHERE line_id = ?1)",
        params![id.get() as i64],
        |row| row.get(0),
    )?;

    if exists {
        Ok(())
    } else {
        Err(AccessError::LineNotFound(id).into())
    }
}

/// Decode a 32-byte identity column.
fn blob_to_identity(bytes: Vec<u8>, col: &'static str) -> rusqlite::Result<Identity> {
    let arr: [u8; 32] = bytes.try_into().map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, col.to_string(), rusqlite::types::Type::Blob)
    })?;
    Ok(Identity::from_bytes(arr))
}

/// Convert a row to a Message.
fn row_to_message(line: LineId, row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let seq: i64 = row.get("seq")?;
    let sender_bytes: Vec<u8> = row.get("sender")?;
    let timestamp: i64 = row.get("timestamp")?;
    let ciphertext: Vec<u8> = row.get("ciphertext")?;

    Ok(Message {
        line_id: line,
        id: MessageId::new(seq as u64),
        sender: blob_to_identity(sender_bytes, "sender")?,
        timestamp,
        ciphertext: Bytes::from(ciphertext),
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_line(&self, line: NewLine) -> Result<LineId> {
        validate_line_name(&line.name)?;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO lines (name, creator, created_at) VALUES (?1, ?2, ?3)",
                params![
                    &line.name,
                    line.creator.as_bytes().as_slice(),
                    line.created_at
                ],
            )?;
            let id = LineId::new(tx.last_insert_rowid() as u64);

            // Guarded: a secret bound at a freshly allocated id means the
            // handle table is out of step with the directory.
            let bound: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM secrets WHERE line_id = ?1)",
                params![id.get() as i64],
                |row| row.get(0),
            )?;
            if bound {
                return Err(AccessError::AlreadyInitialized(id).into());
            }

            tx.execute(
                "INSERT INTO secrets (line_id, handle) VALUES (?1, ?2)",
                params![id.get() as i64, line.secret_handle.as_bytes().as_slice()],
            )?;

            tx.execute(
                "INSERT INTO members (line_id, identity, joined_at) VALUES (?1, ?2, ?3)",
                params![
                    id.get() as i64,
                    line.creator.as_bytes().as_slice(),
                    line.created_at
                ],
            )?;

            tx.execute(
                "INSERT INTO capability_grants (line_id, identity, granted_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    id.get() as i64,
                    line.creator.as_bytes().as_slice(),
                    line.created_at
                ],
            )?;

            tx.commit()?;
            Ok(id)
        })
        .await
    }

    async fn get_line(&self, id: LineId) -> Result<LineMetadata> {
        self.with_conn(move |conn| {
            let meta = conn
                .query_row(
                    "SELECT l.name, l.creator, l.created_at,
                            (SELECT COUNT(*) FROM members m WHERE m.line_id = l.line_id)
                     FROM lines l WHERE l.line_id = ?1",
                    params![id.get() as i64],
                    |row| {
                        let name: String = row.get(0)?;
                        let creator_bytes: Vec<u8> = row.get(1)?;
                        let created_at: i64 = row.get(2)?;
                        let member_count: i64 = row.get(3)?;
                        Ok(LineMetadata {
                            id,
                            name,
                            creator: blob_to_identity(creator_bytes, "creator")?,
                            created_at,
                            member_count: member_count as u64,
                        })
                    },
                )
                .optional()?;

            meta.ok_or_else(|| AccessError::LineNotFound(id).into())
        })
        .await
    }

    async fn line_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM lines", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn list_lines(&self) -> Result<Vec<LineId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT line_id FROM lines ORDER BY line_id")?;
            let ids = stmt
                .query_map([], |row| {
                    let id: i64 = row.get(0)?;
                    Ok(LineId::new(id as u64))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
        .await
    }

    async fn add_member(&self, line: LineId, identity: Identity) -> Result<()> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            let present: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM members WHERE line_id = ?1 AND identity = ?2)",
                params![line.get() as i64, identity.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            if present {
                return Err(AccessError::AlreadyMember { line, identity }.into());
            }

            conn.execute(
                "INSERT INTO members (line_id, identity, joined_at) VALUES (?1, ?2, ?3)",
                params![
                    line.get() as i64,
                    identity.as_bytes().as_slice(),
                    now_millis()
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn is_member(&self, line: LineId, identity: Identity) -> Result<bool> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            let present: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM members WHERE line_id = ?1 AND identity = ?2)",
                params![line.get() as i64, identity.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            Ok(present)
        })
        .await
    }

    async fn member_count(&self, line: LineId) -> Result<u64> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM members WHERE line_id = ?1",
                params![line.get() as i64],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
    }

    async fn members(&self, line: LineId) -> Result<Vec<Identity>> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            let mut stmt = conn
                .prepare("SELECT identity FROM members WHERE line_id = ?1 ORDER BY identity")?;
            let members = stmt
                .query_map(params![line.get() as i64], |row| {
                    let bytes: Vec<u8> = row.get(0)?;
                    blob_to_identity(bytes, "identity")
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(members)
        })
        .await
    }

    async fn append_message(
        &self,
        line: LineId,
        sender: Identity,
        timestamp: i64,
        ciphertext: Bytes,
    ) -> Result<MessageId> {
        validate_ciphertext(&ciphertext)?;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            require_line(&tx, line)?;

            // Membership check and append share the transaction, so the
            // sender cannot lose membership between check and write.
            let member: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM members WHERE line_id = ?1 AND identity = ?2)",
                params![line.get() as i64, sender.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            if !member {
                return Err(AccessError::NotAMember {
                    line,
                    identity: sender,
                }
                .into());
            }

            let seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq) + 1, 0) FROM messages WHERE line_id = ?1",
                params![line.get() as i64],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO messages (line_id, seq, sender, timestamp, ciphertext)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    line.get() as i64,
                    seq,
                    sender.as_bytes().as_slice(),
                    timestamp,
                    ciphertext.as_ref()
                ],
            )?;

            tx.commit()?;
            Ok(MessageId::new(seq as u64))
        })
        .await
    }

    async fn get_message(&self, line: LineId, id: MessageId) -> Result<Message> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            let message = conn
                .query_row(
                    "SELECT seq, sender, timestamp, ciphertext
                     FROM messages WHERE line_id = ?1 AND seq = ?2",
                    params![line.get() as i64, id.get() as i64],
                    |row| row_to_message(line, row),
                )
                .optional()?;

            message.ok_or_else(|| AccessError::MessageNotFound { line, message: id }.into())
        })
        .await
    }

    async fn message_count(&self, line: LineId) -> Result<u64> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE line_id = ?1",
                params![line.get() as i64],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
    }

    async fn messages_range(
        &self,
        line: LineId,
        start: MessageId,
        end: MessageId,
    ) -> Result<Vec<Message>> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            let mut stmt = conn.prepare(
                "SELECT seq, sender, timestamp, ciphertext
                 FROM messages WHERE line_id = ?1 AND seq >= ?2 AND seq <= ?3
                 ORDER BY seq",
            )?;

            let messages = stmt
                .query_map(
                    params![line.get() as i64, start.get() as i64, end.get() as i64],
                    |row| row_to_message(line, row),
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(messages)
        })
        .await
    }

    async fn secret_handle(&self, line: LineId) -> Result<SecretHandle> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            let bytes: Vec<u8> = conn
                .query_row(
                    "SELECT handle FROM secrets WHERE line_id = ?1",
                    params![line.get() as i64],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| {
                    StoreError::InvalidData(format!("line {line} exists without a secret handle"))
                })?;

            let arr: [u8; 32] = bytes.try_into().map_err(|_| {
                StoreError::InvalidData(format!("malformed secret handle for line {line}"))
            })?;
            Ok(SecretHandle::from_bytes(arr))
        })
        .await
    }

    async fn record_capability_grant(&self, line: LineId, identity: Identity) -> Result<()> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            // Idempotent: the primary key makes re-recording a no-op.
            conn.execute(
                "INSERT OR IGNORE INTO capability_grants (line_id, identity, granted_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    line.get() as i64,
                    identity.as_bytes().as_slice(),
                    now_millis()
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn capability_grants(&self, line: LineId) -> Result<Vec<Identity>> {
        self.with_conn(move |conn| {
            require_line(conn, line)?;

            let mut stmt = conn.prepare(
                "SELECT identity FROM capability_grants WHERE line_id = ?1 ORDER BY identity",
            )?;
            let grants = stmt
                .query_map(params![line.get() as i64], |row| {
                    let bytes: Vec<u8> = row.get(0)?;
                    blob_to_identity(bytes, "identity")
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(grants)
        })
        .await
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(tag: u8) -> Identity {
        Identity::from_bytes([tag; 32])
    }

    fn new_line(name: &str, creator: Identity, handle_tag: u8) -> NewLine {
        NewLine {
            name: name.to_string(),
            creator,
            created_at: 1_700_000_000_000,
            secret_handle: SecretHandle::from_bytes([handle_tag; 32]),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_line() {
        let store = SqliteStore::open_memory().unwrap();
        let creator = identity(1);

        let id = store
            .insert_line(new_line("Night Shift", creator, 0x11))
            .await
            .unwrap();
        assert_eq!(id, LineId::FIRST);

        let meta = store.get_line(id).await.unwrap();
        assert_eq!(meta.name, "Night Shift");
        assert_eq!(meta.creator, creator);
        assert_eq!(meta.member_count, 1);
    }

    #[tokio::test]
    async fn test_empty_name_allocates_nothing() {
        let store = SqliteStore::open_memory().unwrap();

        let err = store
            .insert_line(new_line("", identity(1), 0x11))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Access(AccessError::EmptyLineName)
        ));
        assert_eq!(store.line_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_creation_seeds_membership_and_grant() {
        let store = SqliteStore::open_memory().unwrap();
        let creator = identity(1);
        let id = store
            .insert_line(new_line("ops", creator, 0x11))
            .await
            .unwrap();

        assert!(store.is_member(id, creator).await.unwrap());
        assert_eq!(store.capability_grants(id).await.unwrap(), vec![creator]);
        assert_eq!(
            store.secret_handle(id).await.unwrap(),
            SecretHandle::from_bytes([0x11; 32])
        );
    }

    #[tokio::test]
    async fn test_duplicate_member_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        let creator = identity(1);
        let joiner = identity(2);
        let id = store
            .insert_line(new_line("ops", creator, 0x11))
            .await
            .unwrap();

        store.add_member(id, joiner).await.unwrap();
        let err = store.add_member(id, joiner).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Access(AccessError::AlreadyMember { .. })
        ));
        assert_eq!(store.member_count(id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_append_requires_membership() {
        let store = SqliteStore::open_memory().unwrap();
        let creator = identity(1);
        let outsider = identity(9);
        let id = store
            .insert_line(new_line("ops", creator, 0x11))
            .await
            .unwrap();

        let err = store
            .append_message(id, outsider, 0, Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Access(AccessError::NotAMember { .. })
        ));

        let m0 = store
            .append_message(id, creator, 5, Bytes::from_static(b"\xde\xad"))
            .await
            .unwrap();
        assert_eq!(m0, MessageId::new(0));

        let stored = store.get_message(id, m0).await.unwrap();
        assert_eq!(stored.sender, creator);
        assert_eq!(stored.timestamp, 5);
        assert_eq!(stored.ciphertext, Bytes::from_static(b"\xde\xad"));
    }

    #[tokio::test]
    async fn test_grant_recording_is_idempotent() {
        let store = SqliteStore::open_memory().unwrap();
        let creator = identity(1);
        let joiner = identity(2);
        let id = store
            .insert_line(new_line("ops", creator, 0x11))
            .await
            .unwrap();

        store.record_capability_grant(id, joiner).await.unwrap();
        store.record_capability_grant(id, joiner).await.unwrap();
        assert_eq!(
            store.capability_grants(id).await.unwrap(),
            vec![creator, joiner]
        );
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confide.db");
        let creator = identity(1);

        {
            let store = SqliteStore::open(&path).unwrap();
            let id = store
                .insert_line(new_line("durable", creator, 0x22))
                .await
                .unwrap();
            store
                .append_message(id, creator, 1, Bytes::from_static(b"z"))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.line_count().await.unwrap(), 1);
        let meta = store.get_line(LineId::FIRST).await.unwrap();
        assert_eq!(meta.name, "durable");
        assert_eq!(store.message_count(LineId::FIRST).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_line_everywhere() {
        let store = SqliteStore::open_memory().unwrap();
        let ghost = LineId::new(42);

        assert!(matches!(
            store.get_line(ghost).await.unwrap_err(),
            StoreError::Access(AccessError::LineNotFound(_))
        ));
        assert!(matches!(
            store.is_member(ghost, identity(1)).await.unwrap_err(),
            StoreError::Access(AccessError::LineNotFound(_))
        ));
        assert!(matches!(
            store.message_count(ghost).await.unwrap_err(),
            StoreError::Access(AccessError::LineNotFound(_))
        ));
        assert!(matches!(
            store.secret_handle(ghost).await.unwrap_err(),
            StoreError::Access(AccessError::LineNotFound(_))
        ));
    }
}
