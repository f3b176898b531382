//! The external confidential-computation engine, seen from this core.
//!
//! The engine generates secrets under threshold cryptography and later
//! discloses them to authorized members. This core only issues handles
//! and grants: it never waits on, or mediates, member-initiated
//! decryption.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use confide_core::{Identity, SecretHandle};

use crate::error::EngineError;

/// The inclusive numeric domain a secret is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDomain {
    /// Smallest admissible secret value.
    pub min: u32,
    /// Largest admissible secret value.
    pub max: u32,
}

impl SecretDomain {
    /// The 8-digit base-10 domain used by line secrets.
    pub const EIGHT_DIGIT: Self = Self {
        min: 10_000_000,
        max: 99_999_999,
    };

    /// Whether a value falls inside this domain.
    pub const fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for SecretDomain {
    fn default() -> Self {
        Self::EIGHT_DIGIT
    }
}

/// The engine interface this core consumes.
///
/// Both operations are fire-and-forget delegations: the core does not
/// depend on any out-of-band decryption traffic that follows. Disclosure
/// of the plaintext secret to a granted member happens directly between
/// member and engine, outside this trait.
#[async_trait]
pub trait SecretEngine: Send + Sync {
    /// Generate a fresh secret, uniformly distributed over `domain`, and
    /// return an opaque handle referencing it. Called exactly once per
    /// line, at creation.
    async fn generate_secret(&self, domain: SecretDomain) -> Result<SecretHandle, EngineError>;

    /// Authorize `identity` to request disclosure of the secret behind
    /// `handle`. Idempotent: granting an already-granted identity is not
    /// an error.
    async fn grant_decrypt_capability(
        &self,
        handle: &SecretHandle,
        identity: &Identity,
    ) -> Result<(), EngineError>;
}
