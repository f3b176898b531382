//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use confide::{Coordinator, CoordinatorConfig, Identity, LineId, Result};
use confide_store::MemoryStore;
use confide_vault::LocalSecretEngine;

/// A deterministic identity from a single-byte tag.
pub fn identity(tag: u8) -> Identity {
    Identity::from_bytes([tag; 32])
}

/// `count` distinct deterministic identities, tagged 1..=count.
pub fn identities(count: u8) -> Vec<Identity> {
    (1..=count).map(identity).collect()
}

/// A test fixture with a coordinator over in-memory storage and a local
/// secret engine.
pub struct TestFixture {
    pub coordinator: Coordinator<MemoryStore, LocalSecretEngine>,
}

impl TestFixture {
    /// Create a fixture with default configuration.
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    /// Create a fixture with a specific configuration.
    pub fn with_config(config: CoordinatorConfig) -> Self {
        Self {
            coordinator: Coordinator::new(MemoryStore::new(), LocalSecretEngine::new(), config),
        }
    }

    /// Create a line with `member_count` members: identity(1) creates it
    /// and identities 2..=member_count join. Returns the line and its
    /// members.
    pub async fn line_with_members(
        &self,
        name: &str,
        member_count: u8,
    ) -> Result<(LineId, Vec<Identity>)> {
        assert!(member_count >= 1, "a line always has its creator");

        let members = identities(member_count);
        let line = self.coordinator.create_line(name, members[0]).await?;
        for joiner in &members[1..] {
            self.coordinator.join_line(line, *joiner).await?;
        }

        Ok((line, members))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
