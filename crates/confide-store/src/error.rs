//! Error types for the store module.

use thiserror::Error;

use confide_core::AccessError;

/// Errors that can occur during store operations.
///
/// Precondition violations pass through as [`AccessError`] so callers can
/// match on the taxonomy without caring which backend raised it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A precondition violation (not-found, duplicate member, ...).
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking task could not run to completion.
    #[error("background task failed: {0}")]
    Background(String),

    /// Stored data violates an invariant the schema should uphold.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
