//! # Confide
//!
//! The unified API for Confide - confidential group lines with a single
//! shared secret, a monotonic membership set, and an append-only log of
//! encrypted messages per line.
//!
//! ## Overview
//!
//! Confide is the access-control and secret-distribution core of a
//! confidential group-messaging system:
//!
//! - **Lines**: named, persistent channels. Created once, never deleted.
//! - **Membership**: strictly additive. The creator is a member from
//!   creation; others join exactly once. No leave, no kick.
//! - **Secrets**: one per line, generated by an external
//!   confidential-computation engine. The core holds only opaque handles
//!   and records capability grants - never plaintext.
//! - **Messages**: encrypted client-side, appended by members only,
//!   immutable, sequenced from zero.
//!
//! ## Key Concepts
//!
//! - **Capability grant**: authorization for an identity to request
//!   secret disclosure from the engine. Granted at creation and on join.
//! - **Change events**: every successful mutation emits exactly one
//!   event, after commit, for observers and indexers.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use confide::{Coordinator, CoordinatorConfig, Identity};
//! use confide::store::SqliteStore;
//! use confide::vault::LocalSecretEngine;
//!
//! async fn example() {
//!     let store = SqliteStore::open("confide.db").unwrap();
//!     let engine = LocalSecretEngine::new();
//!     let coordinator = Coordinator::new(store, engine, CoordinatorConfig::default());
//!
//!     let creator = Identity::from_bytes([1; 32]);
//!     let line_id = coordinator.create_line("Night Shift", creator).await.unwrap();
//!
//!     let joiner = Identity::from_bytes([2; 32]);
//!     coordinator.join_line(line_id, joiner).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `confide::core` - Core primitives (LineId, Identity, Message, ...)
//! - `confide::store` - Storage abstraction and SQLite
//! - `confide::vault` - Secret engine boundary and message ciphers

pub mod coordinator;
pub mod error;

pub use confide_core as core;
pub use confide_store as store;
pub use confide_vault as vault;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use error::{CoordinatorError, Result};

pub use confide_core::{
    AccessError, ChangeEvent, Identity, LineId, LineMetadata, Message, MessageId, SecretHandle,
};
