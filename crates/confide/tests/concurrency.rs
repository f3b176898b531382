//! Races against the serialized-mutation guarantee.

use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;

use confide::{AccessError, Coordinator, CoordinatorConfig, CoordinatorError, Identity};
use confide_store::{MemoryStore, SqliteStore, Store};
use confide_vault::LocalSecretEngine;

fn identity(tag: u8) -> Identity {
    Identity::from_bytes([tag; 32])
}

fn coordinator<S: Store>(store: S) -> Arc<Coordinator<S, LocalSecretEngine>> {
    Arc::new(Coordinator::new(
        store,
        LocalSecretEngine::new(),
        CoordinatorConfig::default(),
    ))
}

/// Two concurrent joins for the same (line, identity): exactly one may
/// succeed, the other must observe AlreadyMember.
async fn race_double_join<S: Store + 'static>(store: S) -> Result<()> {
    let coordinator = coordinator(store);
    let creator = identity(1);
    let joiner = identity(2);
    let line = coordinator.create_line("ops", creator).await?;

    let a = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.join_line(line, joiner).await })
    };
    let b = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.join_line(line, joiner).await })
    };

    let results = [a.await?, b.await?];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(CoordinatorError::Access(AccessError::AlreadyMember { .. }))
            )
        })
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(rejected, 1);
    assert_eq!(coordinator.member_count(line).await?, 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn double_join_race_on_memory() -> Result<()> {
    race_double_join(MemoryStore::new()).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn double_join_race_on_sqlite() -> Result<()> {
    race_double_join(SqliteStore::open_memory()?).await
}

/// Concurrent posts from distinct members both land, with distinct
/// sequence numbers and a count of exactly two.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_get_distinct_sequences() -> Result<()> {
    let coordinator = coordinator(MemoryStore::new());
    let creator = identity(1);
    let joiner = identity(2);
    let line = coordinator.create_line("ops", creator).await?;
    coordinator.join_line(line, joiner).await?;

    let a = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(
            async move { coordinator.post_message(line, creator, Bytes::from_static(b"\x01")).await },
        )
    };
    let b = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(
            async move { coordinator.post_message(line, joiner, Bytes::from_static(b"\x02")).await },
        )
    };

    let id_a = a.await??;
    let id_b = b.await??;
    assert_ne!(id_a, id_b);
    assert_eq!(coordinator.message_count(line).await?, 2);

    Ok(())
}

/// Concurrent creates allocate distinct, dense line ids.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_allocate_unique_ids() -> Result<()> {
    let coordinator = coordinator(MemoryStore::new());

    let tasks: Vec<_> = (1..=8u8)
        .map(|tag| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .create_line(&format!("line-{tag}"), identity(tag))
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await??);
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(ids.first().unwrap().get(), 1);
    assert_eq!(ids.last().unwrap().get(), 8);
    assert_eq!(coordinator.line_count().await?, 8);

    Ok(())
}
