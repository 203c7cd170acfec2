use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ledger::TxLedger;
use crate::rpc::{WalletRpc, OP_EXECUTING, OP_FAILED, OP_SUCCESS};
use std::sync::Arc;
use std::time::Duration;

/// Turns "submit a transaction" into "confirmed txid or failure". Every
/// value-moving action (request, identity-ack, message, merge) goes through
/// here; callers mutate their own state only after success.
///
/// Dropping the returned future cancels the confirmation loop at the next
/// await point, which is how an abandoned dialog abandons its operation.
#[derive(Clone)]
pub struct OperationMonitor {
    rpc: Arc<dyn WalletRpc>,
    ledger: TxLedger,
    config: EngineConfig,
}

impl OperationMonitor {
    pub fn new(rpc: Arc<dyn WalletRpc>, ledger: TxLedger, config: EngineConfig) -> Self {
        Self {
            rpc,
            ledger,
            config,
        }
    }

    pub async fn send(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        fee: u64,
        memo_hex: &str,
    ) -> Result<String, EngineError> {
        let operation_id = self
            .rpc
            .send_memo(from, to, amount, fee, memo_hex)
            .await
            .map_err(|e| EngineError::Submission(e.to_string()))?;
        log::debug!("operation {operation_id} submitted to {to}");
        let txid = self.await_confirmation(&operation_id).await?;
        // Our own memo must never be reinterpreted by the poll loop.
        self.ledger.mark_processed(&txid).await?;
        log::info!("operation {operation_id} confirmed as {txid}");
        Ok(txid)
    }

    async fn await_confirmation(&self, operation_id: &str) -> Result<String, EngineError> {
        let statuses = self
            .rpc
            .operation_status(operation_id)
            .await
            .map_err(|e| EngineError::Rpc(e.to_string()))?;
        let first = statuses
            .first()
            .map(|s| s.status.clone())
            .unwrap_or_default();
        if first != OP_EXECUTING && first != OP_SUCCESS {
            return Err(EngineError::Operation(format!(
                "operation {operation_id} entered state {first:?}"
            )));
        }
        let backoff = Duration::from_millis(self.config.result_poll_interval_ms);
        for _ in 0..self.config.max_result_polls {
            tokio::time::sleep(backoff).await;
            let results = self
                .rpc
                .operation_result(operation_id)
                .await
                .map_err(|e| EngineError::Rpc(e.to_string()))?;
            let Some(record) = results.into_iter().next() else {
                continue;
            };
            if record.status == OP_FAILED {
                return Err(EngineError::Operation(format!(
                    "operation {operation_id} failed"
                )));
            }
            if let Some(txid) = record.txid {
                return Ok(txid);
            }
        }
        Err(EngineError::Operation(format!(
            "operation {operation_id} unresolved after {} polls",
            self.config.max_result_polls
        )))
    }
}
