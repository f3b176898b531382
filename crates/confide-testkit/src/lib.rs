//! # Confide Testkit
//!
//! Testing utilities for Confide.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a ready-made coordinator over in-memory storage and a
//!   local secret engine, plus deterministic identities
//! - **Generators**: proptest strategies for line names, identities,
//!   ciphertexts, and secret values
//! - **Golden vectors**: known plaintext/ciphertext pairs for the
//!   reference keystream cipher, for cross-implementation verification
//!
//! ## Fixtures
//!
//! ```rust,no_run
//! use confide_testkit::fixtures::{identity, TestFixture};
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     let line = fixture
//!         .coordinator
//!         .create_line("ops", identity(1))
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use confide_testkit::generators::{ciphertext, secret_value};
//!
//! proptest! {
//!     #[test]
//!     fn roundtrip(secret in secret_value(), plaintext in ciphertext()) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{identities, identity, TestFixture};
pub use generators::{ciphertext, identity_strategy, line_name, secret_value};
pub use vectors::{all_vectors, verify_all_vectors, CipherVector};
