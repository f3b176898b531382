//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use confide_core::{
    validate_ciphertext, validate_line_name, AccessError, Identity, LineId, LineMetadata, Message,
    MessageId, SecretHandle,
};

use crate::error::Result;
use crate::traits::{NewLine, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// the write lock is the critical section that serializes mutations.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Next line id to allocate. 1-indexed, never reused.
    next_line: u64,

    /// Lines by id, in allocation order.
    lines: BTreeMap<LineId, LineRecord>,
}

struct LineRecord {
    name: String,
    creator: Identity,
    created_at: i64,
    members: BTreeSet<Identity>,
    messages: Vec<Message>,
    secret_handle: SecretHandle,
    grants: BTreeSet<Identity>,
}

impl LineRecord {
    fn metadata(&self, id: LineId) -> LineMetadata {
        LineMetadata {
            id,
            name: self.name.clone(),
            creator: self.creator,
            created_at: self.created_at,
            member_count: self.members.len() as u64,
        }
    }
}

impl MemoryStoreInner {
    fn record(&self, id: LineId) -> Result<&LineRecord> {
        self.lines
            .get(&id)
            .ok_or_else(|| AccessError::LineNotFound(id).into())
    }

    fn record_mut(&mut self, id: LineId) -> Result<&mut LineRecord> {
        self.lines
            .get_mut(&id)
            .ok_or_else(|| AccessError::LineNotFound(id).into())
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                next_line: 1,
                lines: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_line(&self, line: NewLine) -> Result<LineId> {
        validate_line_name(&line.name)?;

        let mut inner = self.inner.write().unwrap();

        let id = LineId::new(inner.next_line);
        if inner.lines.contains_key(&id) {
            // A pre-existing record at a fresh id would already own a secret.
            return Err(AccessError::AlreadyInitialized(id).into());
        }

        let mut members = BTreeSet::new();
        members.insert(line.creator);
        let mut grants = BTreeSet::new();
        grants.insert(line.creator);

        inner.lines.insert(
            id,
            LineRecord {
                name: line.name,
                creator: line.creator,
                created_at: line.created_at,
                members,
                messages: Vec::new(),
                secret_handle: line.secret_handle,
                grants,
            },
        );
        inner.next_line += 1;

        Ok(id)
    }

    async fn get_line(&self, id: LineId) -> Result<LineMetadata> {
        let inner = self.inner.read().unwrap();
        Ok(inner.record(id)?.metadata(id))
    }

    async fn line_count(&self) -> Result<u64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.lines.len() as u64)
    }

    async fn list_lines(&self) -> Result<Vec<LineId>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.lines.keys().copied().collect())
    }

    async fn add_member(&self, line: LineId, identity: Identity) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let record = inner.record_mut(line)?;

        if !record.members.insert(identity) {
            return Err(AccessError::AlreadyMember { line, identity }.into());
        }
        Ok(())
    }

    async fn is_member(&self, line: LineId, identity: Identity) -> Result<bool> {
        let inner = self.inner.read().unwrap();
        Ok(inner.record(line)?.members.contains(&identity))
    }

    async fn member_count(&self, line: LineId) -> Result<u64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.record(line)?.members.len() as u64)
    }

    async fn members(&self, line: LineId) -> Result<Vec<Identity>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.record(line)?.members.iter().copied().collect())
    }

    async fn append_message(
        &self,
        line: LineId,
        sender: Identity,
        timestamp: i64,
        ciphertext: Bytes,
    ) -> Result<MessageId> {
        validate_ciphertext(&ciphertext)?;

        let mut inner = self.inner.write().unwrap();
        let record = inner.record_mut(line)?;

        // Membership is checked under the same lock as the append.
        if !record.members.contains(&sender) {
            return Err(AccessError::NotAMember {
                line,
                identity: sender,
            }
            .into());
        }

        let id = MessageId::new(record.messages.len() as u64);
        record.messages.push(Message {
            line_id: line,
            id,
            sender,
            timestamp,
            ciphertext,
        });

        Ok(id)
    }

    async fn get_message(&self, line: LineId, id: MessageId) -> Result<Message> {
        let inner = self.inner.read().unwrap();
        let record = inner.record(line)?;

        record
            .messages
            .get(id.get() as usize)
            .cloned()
            .ok_or_else(|| AccessError::MessageNotFound { line, message: id }.into())
    }

    async fn message_count(&self, line: LineId) -> Result<u64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.record(line)?.messages.len() as u64)
    }

    async fn messages_range(
        &self,
        line: LineId,
        start: MessageId,
        end: MessageId,
    ) -> Result<Vec<Message>> {
        let inner = self.inner.read().unwrap();
        let record = inner.record(line)?;

        Ok(record
            .messages
            .iter()
            .filter(|m| m.id >= start && m.id <= end)
            .cloned()
            .collect())
    }

    async fn secret_handle(&self, line: LineId) -> Result<SecretHandle> {
        let inner = self.inner.read().unwrap();
        Ok(inner.record(line)?.secret_handle)
    }

    async fn record_capability_grant(&self, line: LineId, identity: Identity) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let record = inner.record_mut(line)?;

        // Monotonic set: re-recording is a no-op.
        record.grants.insert(identity);
        Ok(())
    }

    async fn capability_grants(&self, line: LineId) -> Result<Vec<Identity>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.record(line)?.grants.iter().copied().collect())
    }
}
