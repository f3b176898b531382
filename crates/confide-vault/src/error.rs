//! Error types for the vault boundary.

use thiserror::Error;

use confide_core::{Identity, SecretHandle};

/// Errors surfaced by a [`SecretEngine`](crate::SecretEngine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine could not be reached or refused the request.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The handle does not reference a secret known to the engine.
    #[error("unknown secret handle: {0}")]
    UnknownHandle(SecretHandle),

    /// The identity holds no decryption capability for this handle.
    #[error("identity {identity} holds no capability for handle {handle}")]
    NotAuthorized {
        handle: SecretHandle,
        identity: Identity,
    },
}

/// Errors surfaced by a [`MessageCipher`](crate::MessageCipher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Ciphertext shorter than the cipher's framing requires.
    #[error("ciphertext too short")]
    TruncatedCiphertext,

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong secret or corrupted ciphertext).
    #[error("decryption failed: {0}")]
    Decryption(String),
}
