//! In-process secret engine for tests and development.
//!
//! Holds secrets in memory and enforces the capability check a production
//! engine would enforce under threshold cryptography. Everything is lost
//! when the engine is dropped.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use rand::{Rng, RngCore};

use confide_core::{Identity, SecretHandle};

use crate::engine::{SecretDomain, SecretEngine};
use crate::error::EngineError;

/// In-memory engine implementation. Thread-safe via RwLock.
pub struct LocalSecretEngine {
    inner: RwLock<LocalEngineInner>,
}

struct LocalEngineInner {
    /// Secret values by handle. Only this engine ever sees plaintext.
    secrets: HashMap<SecretHandle, u32>,

    /// Identities granted decryption capability, per handle.
    granted: HashMap<SecretHandle, BTreeSet<Identity>>,
}

impl LocalSecretEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LocalEngineInner {
                secrets: HashMap::new(),
                granted: HashMap::new(),
            }),
        }
    }

    /// Mint a fresh handle. Handles carry no information about the secret.
    fn mint_handle(rng: &mut impl RngCore) -> SecretHandle {
        let mut nonce = [0u8; 32];
        rng.fill_bytes(&mut nonce);

        let mut hasher = blake3::Hasher::new();
        hasher.update(b"confide-vault-v0:");
        hasher.update(&nonce);
        SecretHandle::from_bytes(*hasher.finalize().as_bytes())
    }

    /// Out-of-band disclosure: return the plaintext secret to a granted
    /// identity. This plays the member's side of the member<->engine
    /// exchange in tests; it is not part of [`SecretEngine`] because the
    /// core never mediates it.
    pub fn reveal_secret(
        &self,
        handle: &SecretHandle,
        identity: &Identity,
    ) -> Result<u32, EngineError> {
        let inner = self.inner.read().unwrap();

        let secret = inner
            .secrets
            .get(handle)
            .ok_or(EngineError::UnknownHandle(*handle))?;

        let authorized = inner
            .granted
            .get(handle)
            .is_some_and(|set| set.contains(identity));
        if !authorized {
            return Err(EngineError::NotAuthorized {
                handle: *handle,
                identity: *identity,
            });
        }

        Ok(*secret)
    }

    /// Whether an identity holds a capability for this handle.
    pub fn is_granted(&self, handle: &SecretHandle, identity: &Identity) -> bool {
        let inner = self.inner.read().unwrap();
        inner
            .granted
            .get(handle)
            .is_some_and(|set| set.contains(identity))
    }
}

impl Default for LocalSecretEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretEngine for LocalSecretEngine {
    async fn generate_secret(&self, domain: SecretDomain) -> Result<SecretHandle, EngineError> {
        let mut rng = rand::thread_rng();
        let secret = rng.gen_range(domain.min..=domain.max);

        let mut inner = self.inner.write().unwrap();
        let mut handle = Self::mint_handle(&mut rng);
        while inner.secrets.contains_key(&handle) {
            handle = Self::mint_handle(&mut rng);
        }

        inner.secrets.insert(handle, secret);
        inner.granted.insert(handle, BTreeSet::new());
        Ok(handle)
    }

    async fn grant_decrypt_capability(
        &self,
        handle: &SecretHandle,
        identity: &Identity,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.write().unwrap();

        if !inner.secrets.contains_key(handle) {
            return Err(EngineError::UnknownHandle(*handle));
        }

        // Re-granting is a no-op.
        inner.granted.entry(*handle).or_default().insert(*identity);
        Ok(())
    }
}
