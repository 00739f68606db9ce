//! End-to-end fetches through `SecretGateway` against a mock Key Vault.
//!
//! Covers both client lifetimes and every failure classification.

mod common;

use chrono::Utc;
use common::{MockVault, CLIENT_SECRET};
use keyvault_gateway::{ClientLifecycle, ErrorKind, SecretResult};

const LIFECYCLES: [ClientLifecycle; 2] = [ClientLifecycle::Shared, ClientLifecycle::Ephemeral];

#[tokio::test]
async fn test_existing_secret_is_returned() {
    common::init_test_logging();
    let vault = MockVault::start()
        .await
        .with_secret("database-password", "Sup3rSecret")
        .await;
    let gateway = vault.gateway(CLIENT_SECRET);

    for lifecycle in LIFECYCLES {
        let started = Utc::now();
        match gateway.fetch("database-password", lifecycle).await {
            SecretResult::Success {
                name,
                value,
                retrieved_at,
            } => {
                assert_eq!(name, "database-password");
                assert_eq!(value, "Sup3rSecret");
                assert!(retrieved_at >= started);
            }
            other => panic!("Expected success via {:?}, got {:?}", lifecycle, other),
        }
    }
}

#[tokio::test]
async fn test_absent_secret_is_not_found() {
    let vault = MockVault::start().await;
    let gateway = vault.gateway(CLIENT_SECRET);

    for lifecycle in LIFECYCLES {
        let result = gateway.fetch("missing-secret", lifecycle).await;
        assert_eq!(result.kind(), Some(ErrorKind::SecretNotFound));
        assert_eq!(result.name(), "missing-secret");
    }
}

#[tokio::test]
async fn test_wrong_client_secret_always_fails_authentication() {
    let vault = MockVault::start()
        .await
        .with_secret("database-password", "Sup3rSecret")
        .await;
    let gateway = vault.gateway("wrong-secret");

    for lifecycle in LIFECYCLES {
        for name in ["database-password", "missing-secret", "anything-else"] {
            let result = gateway.fetch(name, lifecycle).await;
            assert_eq!(
                result.kind(),
                Some(ErrorKind::AuthenticationFailed),
                "{} via {:?}",
                name,
                lifecycle
            );
        }
    }
}

#[tokio::test]
async fn test_vault_outage_is_unknown() {
    let vault = MockVault::start().await.failing(503).await;
    let gateway = vault.gateway(CLIENT_SECRET);

    match gateway.fetch("database-password", ClientLifecycle::Shared).await {
        SecretResult::Failure { kind, message, .. } => {
            assert_eq!(kind, ErrorKind::Unknown);
            assert!(message.contains("503"));
        }
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_fetches_share_one_client() {
    let vault = MockVault::start()
        .await
        .with_secret("database-password", "Sup3rSecret")
        .await;
    let gateway = std::sync::Arc::new(vault.gateway(CLIENT_SECRET));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let gateway = gateway.clone();
            let lifecycle = LIFECYCLES[i % 2];
            tokio::spawn(async move { gateway.fetch("database-password", lifecycle).await })
        })
        .collect();

    for task in tasks {
        let result = task.await.unwrap();
        assert!(result.is_success());
    }
}

#[tokio::test]
async fn test_throttled_authority_is_unknown_not_authentication() {
    let vault = MockVault::throttled_authority().await;
    let gateway = vault.gateway(CLIENT_SECRET);

    for lifecycle in LIFECYCLES {
        match gateway.fetch("database-password", lifecycle).await {
            SecretResult::Failure { kind, message, .. } => {
                assert_eq!(kind, ErrorKind::Unknown, "via {:?}", lifecycle);
                assert!(message.contains("429"));
            }
            other => panic!("Expected failure via {:?}, got {:?}", lifecycle, other),
        }
    }
}

#[tokio::test]
async fn test_shared_client_reuses_its_token() {
    let vault = MockVault::start()
        .await
        .with_secret("database-password", "Sup3rSecret")
        .await;
    let gateway = vault.gateway(CLIENT_SECRET);

    for _ in 0..3 {
        let result = gateway
            .fetch("database-password", ClientLifecycle::Shared)
            .await;
        assert!(result.is_success());
    }
    assert_eq!(vault.token_requests().await, 1);

    gateway
        .fetch("database-password", ClientLifecycle::Ephemeral)
        .await;
    assert_eq!(vault.token_requests().await, 2);
}

#[tokio::test]
async fn test_dot_segment_names_are_not_found() {
    let vault = MockVault::start()
        .await
        .with_secret("database-password", "Sup3rSecret")
        .await;
    let gateway = vault.gateway(CLIENT_SECRET);

    for lifecycle in LIFECYCLES {
        for name in [".", ".."] {
            let result = gateway.fetch(name, lifecycle).await;
            assert_eq!(result.kind(), Some(ErrorKind::SecretNotFound), "{:?}", name);
        }
    }
    assert!(vault.received_requests().await.is_empty());
}
