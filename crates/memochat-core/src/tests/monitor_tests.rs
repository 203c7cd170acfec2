use super::fast_config;
use crate::error::EngineError;
use crate::ledger::TxLedger;
use crate::monitor::OperationMonitor;
use crate::rpc::{InMemoryWallet, WalletFailure, WalletRpc};
use crate::store::{shared, MemoryStore};
use std::sync::Arc;

fn monitor(wallet: &InMemoryWallet) -> (OperationMonitor, TxLedger) {
    let store = shared(MemoryStore::new());
    let ledger = TxLedger::new(store);
    (
        OperationMonitor::new(Arc::new(wallet.clone()), ledger.clone(), fast_config()),
        ledger,
    )
}

#[tokio::test]
async fn success_returns_txid_and_marks_it_processed() {
    let wallet = InMemoryWallet::new();
    let (monitor, ledger) = monitor(&wallet);
    let txid = monitor
        .send("zs1from", "zs1to", 10_000, 10_000, "00")
        .await
        .expect("send");
    assert!(!txid.is_empty());
    assert!(ledger.is_processed(&txid).await.expect("ledger"));
    // The operation delivered a note to the recipient.
    let notes = wallet.list_unspent("zs1to", 0).await.expect("unspent");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].txid, txid);
}

#[tokio::test]
async fn rejected_submission_is_terminal() {
    let wallet = InMemoryWallet::new();
    wallet.set_failure(WalletFailure::RejectSubmission).await;
    let (monitor, ledger) = monitor(&wallet);
    let err = monitor
        .send("zs1from", "zs1to", 10_000, 10_000, "00")
        .await
        .expect_err("must fail");
    assert!(matches!(err, EngineError::Submission(_)));
    assert_eq!(ledger.len().await, 0);
}

#[tokio::test]
async fn failed_first_status_skips_the_result_loop() {
    let wallet = InMemoryWallet::new();
    wallet.set_failure(WalletFailure::FailOnStatus).await;
    let (monitor, _) = monitor(&wallet);
    let err = monitor
        .send("zs1from", "zs1to", 10_000, 10_000, "00")
        .await
        .expect_err("must fail");
    assert!(matches!(err, EngineError::Operation(_)));
}

#[tokio::test]
async fn failed_result_is_terminal_without_txid() {
    let wallet = InMemoryWallet::new();
    wallet.set_failure(WalletFailure::FailOnResult).await;
    let (monitor, ledger) = monitor(&wallet);
    let err = monitor
        .send("zs1from", "zs1to", 10_000, 10_000, "00")
        .await
        .expect_err("must fail");
    assert!(matches!(err, EngineError::Operation(_)));
    assert_eq!(ledger.len().await, 0);
}

#[tokio::test]
async fn result_loop_waits_out_empty_responses() {
    let wallet = InMemoryWallet::new();
    wallet.set_result_delay(3).await;
    let (monitor, _) = monitor(&wallet);
    let txid = monitor
        .send("zs1from", "zs1to", 10_000, 10_000, "00")
        .await
        .expect("send");
    assert!(!txid.is_empty());
}

#[tokio::test]
async fn result_loop_is_bounded() {
    let wallet = InMemoryWallet::new();
    // More empty responses than the configured poll budget.
    wallet.set_result_delay(50).await;
    let (monitor, _) = monitor(&wallet);
    let err = monitor
        .send("zs1from", "zs1to", 10_000, 10_000, "00")
        .await
        .expect_err("must time out");
    assert!(matches!(err, EngineError::Operation(_)));
}
