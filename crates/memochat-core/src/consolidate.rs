use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::event::EventBus;
use crate::identity::Identity;
use crate::memo::{self, MemoPayload};
use crate::monitor::OperationMonitor;
use crate::rpc::WalletRpc;
use memochat_api::types::EngineEvent;
use std::sync::Arc;

/// Keeps the note set at the messaging address below the daemon's
/// per-transaction output limit by merging everything into one note.
/// Transport health only; contact and message state are untouched.
#[derive(Clone)]
pub struct Consolidator {
    rpc: Arc<dyn WalletRpc>,
    monitor: OperationMonitor,
    events: EventBus,
    config: EngineConfig,
}

impl Consolidator {
    pub fn new(
        rpc: Arc<dyn WalletRpc>,
        monitor: OperationMonitor,
        events: EventBus,
        config: EngineConfig,
    ) -> Self {
        Self {
            rpc,
            monitor,
            events,
            config,
        }
    }

    /// Merge if the note count has hit the output limit. Returns the merge
    /// txid when one was submitted.
    pub async fn maybe_merge(
        &self,
        identity: &Identity,
        note_count: usize,
    ) -> Result<Option<String>, EngineError> {
        if note_count < self.config.max_notes {
            return Ok(None);
        }
        let balance = self
            .rpc
            .balance(&identity.address)
            .await
            .map_err(|e| EngineError::Rpc(e.to_string()))?;
        let amount = balance
            .checked_sub(self.config.merge_fee)
            .ok_or(EngineError::InsufficientBalance)?;
        let memo_hex = memo::encode(&MemoPayload::Merge).map_err(|_| EngineError::Encode)?;
        log::info!(
            "merging {note_count} notes at {} into one ({amount} after fee)",
            identity.address
        );
        let txid = self
            .monitor
            .send(
                &identity.address,
                &identity.address,
                amount,
                self.config.merge_fee,
                &memo_hex,
            )
            .await?;
        self.events.publish(EngineEvent::NotesMerged {
            txid: txid.clone(),
            amount,
        });
        Ok(Some(txid))
    }
}
