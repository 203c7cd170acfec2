pub mod directory_tests;
pub mod engine_tests;
pub mod identity_tests;
pub mod monitor_tests;

use crate::config::EngineConfig;
use crate::identity::Identity;
use crate::rpc::{
    ChainInfo, InMemoryWallet, OperationResult, OperationStatus, RpcError, Unspent, WalletRpc,
};
use crate::store::{shared, MemoryStore, SharedStore};
use crate::token::Token;
use crate::MessagingEngine;
use async_trait::async_trait;
use std::sync::Arc;

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        poll_interval_ms: 10,
        result_poll_interval_ms: 1,
        max_result_polls: 10,
        ..EngineConfig::default()
    }
}

pub fn engine_on(wallet: &InMemoryWallet, store: SharedStore) -> MessagingEngine {
    MessagingEngine::new(fast_config(), store, Arc::new(wallet.clone()))
}

pub fn engine(wallet: &InMemoryWallet) -> MessagingEngine {
    engine_on(wallet, shared(MemoryStore::new()))
}

pub async fn engine_with_identity(
    wallet: &InMemoryWallet,
    username: &str,
) -> (MessagingEngine, Identity) {
    let engine = engine(wallet);
    let identity = engine.create_identity(username).await.expect("identity");
    (engine, identity)
}

/// Drive a full handshake between two engines sharing one wallet. Returns
/// the token each side uses to address the other's contact record:
/// `(a_sees_b, b_sees_a)`.
pub async fn establish_contact(
    a: &MessagingEngine,
    b: &MessagingEngine,
    b_address: &str,
) -> (Token, Token) {
    a.send_contact_request(b_address).await.expect("request");
    b.poll_once().await.expect("poll b");
    let pending = b.pending_contacts().await;
    assert_eq!(pending.len(), 1, "one pending request at b");
    b.confirm_contact(&pending[0].their_token)
        .await
        .expect("confirm");
    a.poll_once().await.expect("poll a");
    let a_contact = a.contacts().await.pop().expect("contact at a");
    let b_contact = b.contacts().await.pop().expect("contact at b");
    (a_contact.their_token, b_contact.their_token)
}

/// Wallet double whose every call fails; exercises RPC error propagation.
#[derive(Clone)]
pub struct FailingWallet;

#[async_trait]
impl WalletRpc for FailingWallet {
    async fn get_new_address(&self) -> Result<String, RpcError> {
        Err(RpcError("daemon unavailable".to_string()))
    }

    async fn export_key(&self, _address: &str) -> Result<String, RpcError> {
        Err(RpcError("daemon unavailable".to_string()))
    }

    async fn import_private_key(&self, _key: &str) -> Result<String, RpcError> {
        Err(RpcError("daemon unavailable".to_string()))
    }

    async fn send_memo(
        &self,
        _from: &str,
        _to: &str,
        _amount: u64,
        _fee: u64,
        _memo_hex: &str,
    ) -> Result<String, RpcError> {
        Err(RpcError("daemon unavailable".to_string()))
    }

    async fn operation_status(
        &self,
        _operation_id: &str,
    ) -> Result<Vec<OperationStatus>, RpcError> {
        Err(RpcError("daemon unavailable".to_string()))
    }

    async fn operation_result(
        &self,
        _operation_id: &str,
    ) -> Result<Vec<OperationResult>, RpcError> {
        Err(RpcError("daemon unavailable".to_string()))
    }

    async fn list_unspent(&self, _address: &str, _min_conf: u32) -> Result<Vec<Unspent>, RpcError> {
        Err(RpcError("daemon unavailable".to_string()))
    }

    async fn balance(&self, _address: &str) -> Result<u64, RpcError> {
        Err(RpcError("daemon unavailable".to_string()))
    }

    async fn chain_info(&self) -> Result<ChainInfo, RpcError> {
        Err(RpcError("daemon unavailable".to_string()))
    }
}
