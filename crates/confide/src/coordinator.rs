//! The Coordinator: orchestration layer for the four public operations.
//!
//! Every public operation enters here. The coordinator validates
//! preconditions, sequences store and engine calls so that checks precede
//! external-collaborator calls and storage writes, and emits a change
//! event once the mutation has committed. Read operations delegate to the
//! store and emit nothing.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::broadcast;

use confide_core::{
    validate_ciphertext, validate_line_name, ChangeEvent, Identity, LineId, LineMetadata, Message,
    MessageId, SecretHandle,
};
use confide_store::{NewLine, Store};
use confide_vault::{SecretDomain, SecretEngine};

use crate::error::Result;

/// Configuration for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Numeric domain line secrets are drawn from.
    pub secret_domain: SecretDomain,
    /// Capacity of the change-event broadcast channel.
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            secret_domain: SecretDomain::EIGHT_DIGIT,
            event_capacity: 256,
        }
    }
}

/// The access-control coordinator.
///
/// Generic over the storage backend and the external secret engine, so
/// tests run against in-memory implementations of both.
pub struct Coordinator<S: Store, E: SecretEngine> {
    store: Arc<S>,
    engine: Arc<E>,
    config: CoordinatorConfig,
    events: broadcast::Sender<ChangeEvent>,
}

impl<S: Store, E: SecretEngine> Coordinator<S, E> {
    /// Create a new coordinator.
    pub fn new(store: S, engine: E, config: CoordinatorConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            store: Arc::new(store),
            engine: Arc::new(engine),
            config,
            events,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the engine reference.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Subscribe to change events. Each successful mutating operation
    /// emits exactly one event, after its state change has committed.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ChangeEvent) {
        // Best-effort delivery: no live subscribers is not an error.
        let _ = self.events.send(event);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutating Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a line with the caller as creator and first member.
    ///
    /// The secret is generated before any storage write; the line row,
    /// its secret handle, and the creator's membership then commit in one
    /// atomic store operation. A failed insert leaves no trace - the
    /// generated secret is simply never referenced.
    ///
    /// # Errors
    /// `AccessError::EmptyLineName` if the name is empty; no line id is
    /// allocated in that case.
    pub async fn create_line(&self, name: &str, creator: Identity) -> Result<LineId> {
        validate_line_name(name)?;

        let handle = self
            .engine
            .generate_secret(self.config.secret_domain)
            .await?;

        let line_id = self
            .store
            .insert_line(NewLine {
                name: name.to_string(),
                creator,
                created_at: now_millis(),
                secret_handle: handle,
            })
            .await?;

        // Fire-and-forget delegation; the engine treats repeats as no-ops.
        self.engine
            .grant_decrypt_capability(&handle, &creator)
            .await?;

        tracing::info!(line = %line_id, creator = %creator, name, "line created");
        self.emit(ChangeEvent::LineCreated {
            line_id,
            creator,
            name: name.to_string(),
        });

        Ok(line_id)
    }

    /// Join an existing line.
    ///
    /// # Errors
    /// - `AccessError::LineNotFound` if the line is unknown.
    /// - `AccessError::AlreadyMember` if the identity already joined; the
    ///   failed call changes nothing.
    pub async fn join_line(&self, line: LineId, identity: Identity) -> Result<()> {
        self.store.add_member(line, identity).await?;
        self.store.record_capability_grant(line, identity).await?;

        let handle = self.store.secret_handle(line).await?;
        self.engine
            .grant_decrypt_capability(&handle, &identity)
            .await?;

        tracing::info!(line = %line, identity = %identity, "line joined");
        self.emit(ChangeEvent::LineJoined {
            line_id: line,
            identity,
        });

        Ok(())
    }

    /// Post an encrypted message to a line.
    ///
    /// Membership is checked at call time, inside the store's critical
    /// section, never from a cached view.
    ///
    /// # Errors
    /// - `AccessError::LineNotFound` if the line is unknown.
    /// - `AccessError::NotAMember` if the sender is not a member.
    /// - `AccessError::EmptyCiphertext` if the ciphertext is empty.
    pub async fn post_message(
        &self,
        line: LineId,
        sender: Identity,
        ciphertext: Bytes,
    ) -> Result<MessageId> {
        validate_ciphertext(&ciphertext)?;

        let message_id = self
            .store
            .append_message(line, sender, now_millis(), ciphertext)
            .await?;

        tracing::debug!(line = %line, message = %message_id, sender = %sender, "message posted");
        self.emit(ChangeEvent::MessageSent {
            line_id: line,
            message_id,
            sender,
        });

        Ok(message_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read Surface
    // ─────────────────────────────────────────────────────────────────────────

    /// Line metadata snapshot.
    pub async fn line(&self, id: LineId) -> Result<LineMetadata> {
        Ok(self.store.get_line(id).await?)
    }

    /// Total number of lines ever created.
    pub async fn line_count(&self) -> Result<u64> {
        Ok(self.store.line_count().await?)
    }

    /// All line ids, in allocation order.
    pub async fn lines(&self) -> Result<Vec<LineId>> {
        Ok(self.store.list_lines().await?)
    }

    /// Whether an identity is a member of a line.
    pub async fn is_member(&self, line: LineId, identity: Identity) -> Result<bool> {
        Ok(self.store.is_member(line, identity).await?)
    }

    /// Number of members of a line.
    pub async fn member_count(&self, line: LineId) -> Result<u64> {
        Ok(self.store.member_count(line).await?)
    }

    /// All members of a line.
    pub async fn members(&self, line: LineId) -> Result<Vec<Identity>> {
        Ok(self.store.members(line).await?)
    }

    /// A message by position.
    pub async fn message(&self, line: LineId, id: MessageId) -> Result<Message> {
        Ok(self.store.get_message(line, id).await?)
    }

    /// Number of messages in a line's ledger.
    pub async fn message_count(&self, line: LineId) -> Result<u64> {
        Ok(self.store.message_count(line).await?)
    }

    /// Messages with `start <= id <= end`.
    pub async fn messages(
        &self,
        line: LineId,
        start: MessageId,
        end: MessageId,
    ) -> Result<Vec<Message>> {
        Ok(self.store.messages_range(line, start, end).await?)
    }

    /// The opaque secret handle owned by a line.
    pub async fn secret_handle(&self, line: LineId) -> Result<SecretHandle> {
        Ok(self.store.secret_handle(line).await?)
    }

    /// Identities granted decryption capability for a line.
    pub async fn capability_grants(&self, line: LineId) -> Result<Vec<Identity>> {
        Ok(self.store.capability_grants(line).await?)
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
    use confide_core::AccessError;
    use confide_store::MemoryStore;
    use confide_vault::LocalSecretEngine;

    use crate::error::CoordinatorError;

    fn coordinator() -> Coordinator<MemoryStore, LocalSecretEngine> {
        Coordinator::new(
            MemoryStore::new(),
            LocalSecretEngine::new(),
            CoordinatorConfig::default(),
        )
    }

    fn identity(tag: u8) -> Identity {
        Identity::from_bytes([tag; 32])
    }

    #[tokio::test]
    async fn test_create_grants_creator_capability() {
        let coordinator = coordinator();
        let creator = identity(1);

        let id = coordinator.create_line("ops", creator).await.unwrap();

        let handle = coordinator.secret_handle(id).await.unwrap();
        assert!(coordinator.engine().is_granted(&handle, &creator));
        assert_eq!(coordinator.capability_grants(id).await.unwrap(), vec![creator]);
    }

    #[tokio::test]
    async fn test_empty_name_emits_nothing() {
        let coordinator = coordinator();
        let mut events = coordinator.subscribe();

        let err = coordinator.create_line("", identity(1)).await.unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::Access(AccessError::EmptyLineName)
        ));
        assert_eq!(coordinator.line_count().await.unwrap(), 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_events_emitted_in_operation_order() {
        let coordinator = coordinator();
        let creator = identity(1);
        let joiner = identity(2);
        let mut events = coordinator.subscribe();

        let id = coordinator.create_line("ops", creator).await.unwrap();
        coordinator.join_line(id, joiner).await.unwrap();
        let m0 = coordinator
            .post_message(id, joiner, Bytes::from_static(b"\x01"))
            .await
            .unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            ChangeEvent::LineCreated {
                line_id: id,
                creator,
                name: "ops".to_string()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            ChangeEvent::LineJoined {
                line_id: id,
                identity: joiner
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            ChangeEvent::MessageSent {
                line_id: id,
                message_id: m0,
                sender: joiner
            }
        );
    }

    #[tokio::test]
    async fn test_join_grants_capability() {
        let coordinator = coordinator();
        let creator = identity(1);
        let joiner = identity(2);

        let id = coordinator.create_line("ops", creator).await.unwrap();
        coordinator.join_line(id, joiner).await.unwrap();

        let handle = coordinator.secret_handle(id).await.unwrap();
        assert!(coordinator.engine().is_granted(&handle, &joiner));
    }
}
