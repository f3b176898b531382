//! # Confide Vault
//!
//! The secret-distribution boundary of Confide.
//!
//! Each line owns exactly one shared secret, generated once at line
//! creation by an external confidential-computation engine. This crate
//! defines that boundary:
//!
//! - [`SecretEngine`] - the trait the external engine is consumed through
//! - [`LocalSecretEngine`] - an in-process engine for tests and development
//! - [`MessageCipher`] - the pluggable client-side symmetric cipher, with
//!   the reference keystream implementation ([`XorCipher`]) and an
//!   authenticated alternative ([`AeadCipher`])
//!
//! The core never sees a secret in plaintext. It holds
//! [`SecretHandle`](confide_core::SecretHandle) references and records
//! which identities were granted decryption capability; actual disclosure
//! happens out-of-band, directly between a member and the engine.

pub mod cipher;
pub mod engine;
pub mod error;
pub mod local;

pub use cipher::{AeadCipher, MessageCipher, XorCipher};
pub use engine::{SecretDomain, SecretEngine};
pub use error::{CipherError, EngineError};
pub use local::LocalSecretEngine;
