//! The access-control error taxonomy.
//!
//! Every variant is a precondition violation: synchronous, caller-visible,
//! and non-retryable. No operation partially applies its effects when one
//! of these is returned.

use thiserror::Error;

use crate::types::{Identity, LineId, MessageId};

/// Precondition violations surfaced by the access-control core.
///
/// Four categories: not-found (unknown line or message), invalid input
/// (empty name or ciphertext), duplicate join, and posting without
/// membership.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The referenced line was never allocated.
    #[error("line not found: {0}")]
    LineNotFound(LineId),

    /// The referenced message is out of range for its line.
    #[error("message {message} not found in line {line}")]
    MessageNotFound { line: LineId, message: MessageId },

    /// A line name must be non-empty.
    #[error("line name must not be empty")]
    EmptyLineName,

    /// Message ciphertext must be non-empty.
    #[error("message ciphertext must not be empty")]
    EmptyCiphertext,

    /// Join attempted by an identity that is already a member.
    #[error("identity {identity} is already a member of line {line}")]
    AlreadyMember { line: LineId, identity: Identity },

    /// Message post attempted by a non-member.
    #[error("identity {identity} is not a member of line {line}")]
    NotAMember { line: LineId, identity: Identity },

    /// Secret issuance attempted twice for the same line. Guarded even
    /// though the public surface never calls issuance more than once.
    #[error("secret already issued for line {0}")]
    AlreadyInitialized(LineId),
}

impl AccessError {
    /// Whether this error is a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AccessError::LineNotFound(_) | AccessError::MessageNotFound { .. }
        )
    }

    /// Whether this error is an invalid-input condition.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AccessError::EmptyLineName | AccessError::EmptyCiphertext
        )
    }
}
