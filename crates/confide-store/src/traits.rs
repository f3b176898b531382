//! Store trait: the abstract interface for line-state persistence.
//!
//! This trait allows the coordinator to be storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use bytes::Bytes;

use confide_core::{Identity, LineId, LineMetadata, Message, MessageId, SecretHandle};

use crate::error::Result;

/// Everything needed to create a line in one atomic step.
#[derive(Debug, Clone)]
pub struct NewLine {
    /// Line name. Must be non-empty.
    pub name: String,
    /// The creating identity; seeded as the first member.
    pub creator: Identity,
    /// Creation time (Unix milliseconds).
    pub created_at: i64,
    /// Handle minted by the secret engine for this line.
    pub secret_handle: SecretHandle,
}

/// The Store trait: async interface for line-state persistence.
///
/// All methods are async to support both sync (SQLite) and async
/// backends. For SQLite, `spawn_blocking` is used internally to avoid
/// blocking the runtime.
///
/// # Contract
///
/// - **Mutations are indivisible**: each mutating method either fully
///   applies or leaves no trace. Implementations serialize mutations so
///   precondition checks and writes happen in one critical section.
/// - **Handles are never reused**: `insert_line` allocates strictly
///   increasing, 1-indexed ids.
/// - **Reads are pure**: they never mutate and may run concurrently.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Line Directory
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a line: allocate the next id and atomically record its
    /// metadata, secret handle, creator membership, and the creator's
    /// capability-grant entry.
    ///
    /// # Errors
    /// - `AccessError::EmptyLineName` if the name is empty (no id is
    ///   allocated).
    /// - `AccessError::AlreadyInitialized` if a secret is somehow already
    ///   bound at the allocated id (guarded; unreachable via the public
    ///   surface).
    async fn insert_line(&self, line: NewLine) -> Result<LineId>;

    /// Get a read-only metadata snapshot.
    ///
    /// # Errors
    /// `AccessError::LineNotFound` if the id was never allocated.
    async fn get_line(&self, id: LineId) -> Result<LineMetadata>;

    /// Total number of lines ever created.
    async fn line_count(&self) -> Result<u64>;

    /// All line ids, in allocation order.
    async fn list_lines(&self) -> Result<Vec<LineId>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Membership Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a member to a line.
    ///
    /// # Errors
    /// - `AccessError::LineNotFound` if the line is unknown.
    /// - `AccessError::AlreadyMember` if the identity is already present.
    async fn add_member(&self, line: LineId, identity: Identity) -> Result<()>;

    /// Whether an identity is a member of a line.
    ///
    /// # Errors
    /// `AccessError::LineNotFound` if the line is unknown.
    async fn is_member(&self, line: LineId, identity: Identity) -> Result<bool>;

    /// Number of members. Always equals `members(line).len()`.
    async fn member_count(&self, line: LineId) -> Result<u64>;

    /// All members of a line, in identity order.
    async fn members(&self, line: LineId) -> Result<Vec<Identity>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Message Ledger
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an encrypted message, assigning the next zero-based
    /// sequence number for the line.
    ///
    /// Membership is checked inside the same critical section as the
    /// write, never from a cached view.
    ///
    /// # Errors
    /// - `AccessError::LineNotFound` if the line is unknown.
    /// - `AccessError::NotAMember` if the sender is not currently a member.
    /// - `AccessError::EmptyCiphertext` if the ciphertext is empty.
    async fn append_message(
        &self,
        line: LineId,
        sender: Identity,
        timestamp: i64,
        ciphertext: Bytes,
    ) -> Result<MessageId>;

    /// Get a message by position.
    ///
    /// # Errors
    /// - `AccessError::LineNotFound` if the line is unknown.
    /// - `AccessError::MessageNotFound` if the position is out of range.
    async fn get_message(&self, line: LineId, id: MessageId) -> Result<Message>;

    /// Number of messages in a line's ledger.
    ///
    /// # Errors
    /// `AccessError::LineNotFound` if the line is unknown.
    async fn message_count(&self, line: LineId) -> Result<u64>;

    /// Messages with `start <= id <= end`, ordered by id. Positions past
    /// the ledger head are simply absent from the result.
    async fn messages_range(
        &self,
        line: LineId,
        start: MessageId,
        end: MessageId,
    ) -> Result<Vec<Message>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Secret Vault
    // ─────────────────────────────────────────────────────────────────────────

    /// The opaque secret handle owned by a line. Never plaintext.
    ///
    /// # Errors
    /// `AccessError::LineNotFound` if the line is unknown.
    async fn secret_handle(&self, line: LineId) -> Result<SecretHandle>;

    /// Record that an identity was granted decryption capability.
    /// Idempotent: re-recording an existing grant is a no-op.
    ///
    /// # Errors
    /// `AccessError::LineNotFound` if the line is unknown.
    async fn record_capability_grant(&self, line: LineId, identity: Identity) -> Result<()>;

    /// All identities ever granted capability for a line, in identity
    /// order. Grows monotonically; grants are never removed.
    async fn capability_grants(&self, line: LineId) -> Result<Vec<Identity>>;
}
