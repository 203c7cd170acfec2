use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const OP_EXECUTING: &str = "executing";
pub const OP_SUCCESS: &str = "success";
pub const OP_FAILED: &str = "failed";

#[derive(Debug, Error)]
#[error("{0}")]
pub struct RpcError(pub String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unspent {
    pub txid: String,
    pub amount: u64,
    pub memo_hex: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationStatus {
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationResult {
    pub status: String,
    pub txid: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainInfo {
    pub mediantime: u64,
}

/// Contract of the wallet node daemon. Amounts are base units; operations
/// are daemon-side async actions identified by an opaque id.
#[async_trait]
pub trait WalletRpc: Send + Sync {
    async fn get_new_address(&self) -> Result<String, RpcError>;
    async fn export_key(&self, address: &str) -> Result<String, RpcError>;
    async fn import_private_key(&self, key: &str) -> Result<String, RpcError>;
    async fn send_memo(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        fee: u64,
        memo_hex: &str,
    ) -> Result<String, RpcError>;
    async fn operation_status(&self, operation_id: &str) -> Result<Vec<OperationStatus>, RpcError>;
    async fn operation_result(&self, operation_id: &str) -> Result<Vec<OperationResult>, RpcError>;
    async fn list_unspent(&self, address: &str, min_conf: u32) -> Result<Vec<Unspent>, RpcError>;
    async fn balance(&self, address: &str) -> Result<u64, RpcError>;
    async fn chain_info(&self) -> Result<ChainInfo, RpcError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WalletFailure {
    #[default]
    None,
    RejectSubmission,
    FailOnStatus,
    FailOnResult,
}

#[derive(Clone, Debug)]
pub struct Submission {
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub fee: u64,
    pub memo_hex: String,
}

struct PendingOp {
    submission: Submission,
    txid: String,
    empty_results_left: u32,
    delivered: bool,
}

#[derive(Default)]
struct WalletState {
    next_address: u32,
    keys: HashMap<String, String>,
    notes: HashMap<String, Vec<Unspent>>,
    operations: HashMap<String, PendingOp>,
    submissions: Vec<Submission>,
    mediantime: u64,
    failure: WalletFailure,
    result_delay_polls: u32,
}

/// In-process wallet double: operations succeed after a configurable number
/// of result polls and deliver the note to the recipient address, so two
/// engines sharing one wallet can exercise the full wire round trip.
#[derive(Clone)]
pub struct InMemoryWallet {
    state: Arc<Mutex<WalletState>>,
}

impl Default for InMemoryWallet {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(WalletState {
                mediantime: 1_700_000_000,
                ..WalletState::default()
            })),
        }
    }
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_failure(&self, failure: WalletFailure) {
        self.state.lock().await.failure = failure;
    }

    /// Number of empty result responses before an operation resolves.
    pub async fn set_result_delay(&self, polls: u32) {
        self.state.lock().await.result_delay_polls = polls;
    }

    pub async fn set_mediantime(&self, mediantime: u64) {
        self.state.lock().await.mediantime = mediantime;
    }

    pub async fn advance_mediantime(&self, secs: u64) {
        self.state.lock().await.mediantime += secs;
    }

    /// Inject an inbound transaction, bypassing the operation pipeline.
    pub async fn receive_note(&self, address: &str, txid: &str, amount: u64, memo_hex: &str) {
        let mut state = self.state.lock().await;
        state.notes.entry(address.to_string()).or_default().push(Unspent {
            txid: txid.to_string(),
            amount,
            memo_hex: memo_hex.to_string(),
        });
    }

    pub async fn note_count(&self, address: &str) -> usize {
        let state = self.state.lock().await;
        state.notes.get(address).map(|n| n.len()).unwrap_or(0)
    }

    pub async fn submissions(&self) -> Vec<Submission> {
        self.state.lock().await.submissions.clone()
    }
}

#[async_trait]
impl WalletRpc for InMemoryWallet {
    async fn get_new_address(&self) -> Result<String, RpcError> {
        let mut state = self.state.lock().await;
        state.next_address += 1;
        let address = format!("zs1mock{:0>34}", state.next_address);
        let key = format!("secret-extended-key-{}", state.next_address);
        state.keys.insert(address.clone(), key);
        Ok(address)
    }

    async fn export_key(&self, address: &str) -> Result<String, RpcError> {
        let state = self.state.lock().await;
        state
            .keys
            .get(address)
            .cloned()
            .ok_or_else(|| RpcError(format!("no key for {address}")))
    }

    async fn import_private_key(&self, key: &str) -> Result<String, RpcError> {
        let mut state = self.state.lock().await;
        if let Some(address) = state
            .keys
            .iter()
            .find(|(_, k)| k.as_str() == key)
            .map(|(a, _)| a.clone())
        {
            return Ok(address);
        }
        state.next_address += 1;
        let address = format!("zs1import{:0>31}", state.next_address);
        state.keys.insert(address.clone(), key.to_string());
        Ok(address)
    }

    async fn send_memo(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        fee: u64,
        memo_hex: &str,
    ) -> Result<String, RpcError> {
        let mut state = self.state.lock().await;
        if state.failure == WalletFailure::RejectSubmission {
            return Err(RpcError("sendmemo rejected".to_string()));
        }
        let submission = Submission {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            fee,
            memo_hex: memo_hex.to_string(),
        };
        state.submissions.push(submission.clone());
        let operation_id = format!("opid-{}", Uuid::new_v4());
        let txid = Uuid::new_v4().simple().to_string();
        let empty_results_left = state.result_delay_polls;
        state.operations.insert(
            operation_id.clone(),
            PendingOp {
                submission,
                txid,
                empty_results_left,
                delivered: false,
            },
        );
        Ok(operation_id)
    }

    async fn operation_status(&self, operation_id: &str) -> Result<Vec<OperationStatus>, RpcError> {
        let state = self.state.lock().await;
        if !state.operations.contains_key(operation_id) {
            return Ok(Vec::new());
        }
        let status = match state.failure {
            WalletFailure::FailOnStatus => OP_FAILED,
            _ => OP_EXECUTING,
        };
        Ok(vec![OperationStatus {
            status: status.to_string(),
        }])
    }

    async fn operation_result(&self, operation_id: &str) -> Result<Vec<OperationResult>, RpcError> {
        let mut state = self.state.lock().await;
        if state.failure == WalletFailure::FailOnResult {
            return Ok(vec![OperationResult {
                status: OP_FAILED.to_string(),
                txid: None,
            }]);
        }
        let Some(op) = state.operations.get_mut(operation_id) else {
            return Ok(Vec::new());
        };
        if op.empty_results_left > 0 {
            op.empty_results_left -= 1;
            return Ok(Vec::new());
        }
        let txid = op.txid.clone();
        let submission = op.submission.clone();
        let deliver = !op.delivered;
        op.delivered = true;
        if deliver {
            let note = Unspent {
                txid: txid.clone(),
                amount: submission.amount,
                memo_hex: submission.memo_hex.clone(),
            };
            if submission.to == submission.from {
                // Self-payment merges every note at the address into one.
                state.notes.insert(submission.to.clone(), vec![note]);
            } else {
                state
                    .notes
                    .entry(submission.to.clone())
                    .or_default()
                    .push(note);
            }
        }
        Ok(vec![OperationResult {
            status: OP_SUCCESS.to_string(),
            txid: Some(txid),
        }])
    }

    async fn list_unspent(&self, address: &str, _min_conf: u32) -> Result<Vec<Unspent>, RpcError> {
        let state = self.state.lock().await;
        Ok(state.notes.get(address).cloned().unwrap_or_default())
    }

    async fn balance(&self, address: &str) -> Result<u64, RpcError> {
        let state = self.state.lock().await;
        Ok(state
            .notes
            .get(address)
            .map(|notes| notes.iter().map(|n| n.amount).sum())
            .unwrap_or(0))
    }

    async fn chain_info(&self) -> Result<ChainInfo, RpcError> {
        let state = self.state.lock().await;
        Ok(ChainInfo {
            mediantime: state.mediantime,
        })
    }
}
