use super::{engine_with_identity, establish_contact, fast_config, FailingWallet};
use crate::error::EngineError;
use crate::rpc::InMemoryWallet;
use crate::store::{shared, MemoryStore};
use crate::MessagingEngine;
use memochat_api::types::EngineEvent;
use std::sync::Arc;

#[tokio::test]
async fn polling_the_same_unspent_set_twice_duplicates_nothing() {
    let wallet = InMemoryWallet::new();
    let (a, _) = engine_with_identity(&wallet, "alice").await;
    let (b, b_id) = engine_with_identity(&wallet, "bob").await;
    let (a_sees_b, b_sees_a) = establish_contact(&a, &b, &b_id.address).await;

    a.send_message(&a_sees_b, "once only").await.expect("send");
    b.poll_once().await.expect("poll 1");
    b.poll_once().await.expect("poll 2");
    b.poll_once().await.expect("poll 3");

    assert_eq!(b.contacts().await.len(), 1);
    assert!(b.pending_contacts().await.is_empty());
    let conversation = b.open_conversation(&b_sees_a).await.expect("open");
    assert_eq!(conversation.unread.len(), 1);
    assert!(conversation.read.is_empty());
}

#[tokio::test]
async fn undecodable_memo_is_processed_once_and_mutates_nothing() {
    let wallet = InMemoryWallet::new();
    let (a, a_id) = engine_with_identity(&wallet, "alice").await;
    let mut events = a.subscribe();
    // Hex-decodes fine, fails JSON parsing.
    let memo_hex = hex::encode("definitely not json");
    wallet
        .receive_note(&a_id.address, "garbled-tx", 123_456, &memo_hex)
        .await;

    a.poll_once().await.expect("poll");
    a.poll_once().await.expect("poll again");

    assert!(a.contacts().await.is_empty());
    assert!(a.pending_contacts().await.is_empty());
    // Exactly one value receipt despite two cycles.
    let event = events.try_recv().expect("receipt event");
    assert_eq!(
        event,
        EngineEvent::ValueReceived {
            txid: "garbled-tx".to_string(),
            amount: 123_456,
        }
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn plain_payment_without_memo_is_a_value_receipt() {
    let wallet = InMemoryWallet::new();
    let (a, a_id) = engine_with_identity(&wallet, "alice").await;
    let mut events = a.subscribe();
    wallet.receive_note(&a_id.address, "plain-tx", 50_000, "").await;
    a.poll_once().await.expect("poll");
    let event = events.try_recv().expect("receipt event");
    assert!(matches!(event, EngineEvent::ValueReceived { amount: 50_000, .. }));
}

#[tokio::test]
async fn polling_without_an_identity_is_a_no_op() {
    let wallet = InMemoryWallet::new();
    let engine = super::engine(&wallet);
    engine.poll_once().await.expect("nothing to poll");
}

#[tokio::test]
async fn rpc_outage_surfaces_without_corrupting_state() {
    let engine = MessagingEngine::new(
        fast_config(),
        shared(MemoryStore::new()),
        Arc::new(FailingWallet),
    );
    // No identity yet: the cycle ends before touching the daemon.
    engine.poll_once().await.expect("no identity, no rpc");
    let err = engine.create_identity("alice").await.expect_err("down");
    assert!(matches!(err, EngineError::AddressGeneration(_)));
}

#[tokio::test]
async fn delete_contact_forgets_the_relationship() {
    let wallet = InMemoryWallet::new();
    let (a, _) = engine_with_identity(&wallet, "alice").await;
    let (b, b_id) = engine_with_identity(&wallet, "bob").await;
    let (a_sees_b, _) = establish_contact(&a, &b, &b_id.address).await;
    a.delete_contact(&a_sees_b).await.expect("delete");
    assert!(a.contacts().await.is_empty());
    assert!(matches!(
        a.send_message(&a_sees_b, "hello?").await.expect_err("gone"),
        EngineError::UnknownContact
    ));
}
