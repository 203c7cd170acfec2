use super::{engine, engine_with_identity, fast_config, FailingWallet};
use crate::error::EngineError;
use crate::rpc::InMemoryWallet;
use crate::store::{shared, MemoryStore};
use crate::MessagingEngine;
use memochat_api::validation::ValidationError;
use std::sync::Arc;

#[tokio::test]
async fn create_persists_category_username_address_and_key() {
    let wallet = InMemoryWallet::new();
    let (engine, identity) = engine_with_identity(&wallet, "alice").await;
    assert_eq!(identity.category, "individual");
    assert_eq!(identity.username, "alice");
    assert!(identity.address.starts_with("zs1"));
    assert!(!identity.private_key.is_empty());
    let loaded = engine.identity().await.expect("load").expect("present");
    assert_eq!(loaded, identity);
}

#[tokio::test]
async fn create_is_once_per_wallet() {
    let wallet = InMemoryWallet::new();
    let (engine, _) = engine_with_identity(&wallet, "alice").await;
    let err = engine.create_identity("other").await.expect_err("second");
    assert!(matches!(err, EngineError::IdentityExists));
}

#[tokio::test]
async fn create_rejects_empty_username() {
    let wallet = InMemoryWallet::new();
    let engine = engine(&wallet);
    let err = engine.create_identity("  ").await.expect_err("empty");
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::Empty("username"))
    ));
}

#[tokio::test]
async fn address_generation_failure_creates_nothing() {
    let engine = MessagingEngine::new(
        fast_config(),
        shared(MemoryStore::new()),
        Arc::new(FailingWallet),
    );
    let err = engine.create_identity("alice").await.expect_err("daemon down");
    assert!(matches!(err, EngineError::AddressGeneration(_)));
    assert!(engine.identity().await.expect("load").is_none());
}

#[tokio::test]
async fn rename_updates_in_place() {
    let wallet = InMemoryWallet::new();
    let (engine, identity) = engine_with_identity(&wallet, "alice").await;
    let renamed = engine.rename_identity("alicia").await.expect("rename");
    assert_eq!(renamed.username, "alicia");
    assert_eq!(renamed.address, identity.address);
    assert_eq!(renamed.private_key, identity.private_key);
}

#[tokio::test]
async fn rename_rejects_empty_and_unchanged_names() {
    let wallet = InMemoryWallet::new();
    let (engine, _) = engine_with_identity(&wallet, "alice").await;
    assert!(matches!(
        engine.rename_identity("").await.expect_err("empty"),
        EngineError::Validation(ValidationError::Empty("username"))
    ));
    assert!(matches!(
        engine.rename_identity("alice").await.expect_err("same"),
        EngineError::DuplicateUsername
    ));
}

#[tokio::test]
async fn import_restores_an_identity_from_its_key() {
    let wallet = InMemoryWallet::new();
    let engine = engine(&wallet);
    let restored = engine
        .import_identity("alice", "secret-extended-key-backup")
        .await
        .expect("import");
    assert_eq!(restored.private_key, "secret-extended-key-backup");
    assert!(!restored.address.is_empty());
    let loaded = engine.identity().await.expect("load").expect("present");
    assert_eq!(loaded, restored);
}
