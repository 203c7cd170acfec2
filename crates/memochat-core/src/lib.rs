pub mod config;
pub mod consolidate;
pub mod directory;
pub mod error;
pub mod event;
pub mod handshake;
pub mod identity;
pub mod ledger;
pub mod memo;
pub mod monitor;
pub mod rpc;
pub mod store;
pub mod time;
pub mod token;
pub mod transport;

use config::EngineConfig;
use consolidate::Consolidator;
use directory::{Contact, ContactDirectory, OutgoingRequest, PendingContact};
use error::EngineError;
use event::{EventBus, EventReceiver};
use handshake::Handshake;
use identity::{Identity, IdentityStore};
use ledger::TxLedger;
use memo::MemoPayload;
use memochat_api::types::EngineEvent;
use monitor::OperationMonitor;
use rpc::{Unspent, WalletRpc};
use std::sync::Arc;
use std::time::Duration;
use store::SharedStore;
use token::Token;
use tokio::task::JoinHandle;
use transport::{ChatMessage, Conversation, MessageStore, MessageTransport};

/// The protocol engine. Owns no ambient state: the record store and wallet
/// RPC are injected, every component hangs off this context, and cloning it
/// shares the same underlying state.
#[derive(Clone)]
pub struct MessagingEngine {
    config: EngineConfig,
    rpc: Arc<dyn WalletRpc>,
    identity: IdentityStore,
    directory: ContactDirectory,
    handshake: Handshake,
    transport: MessageTransport,
    consolidator: Consolidator,
    ledger: TxLedger,
    events: EventBus,
}

impl MessagingEngine {
    pub fn new(config: EngineConfig, store: SharedStore, rpc: Arc<dyn WalletRpc>) -> Self {
        let events = EventBus::new(256);
        let ledger = TxLedger::new(store.clone());
        let monitor = OperationMonitor::new(rpc.clone(), ledger.clone(), config.clone());
        let directory = ContactDirectory::new(store.clone());
        let identity = IdentityStore::new(store.clone(), rpc.clone(), config.clone());
        let handshake = Handshake::new(
            directory.clone(),
            monitor.clone(),
            events.clone(),
            config.clone(),
        );
        let transport = MessageTransport::new(
            directory.clone(),
            MessageStore::new(store),
            monitor.clone(),
            rpc.clone(),
            events.clone(),
            config.clone(),
        );
        let consolidator = Consolidator::new(rpc.clone(), monitor, events.clone(), config.clone());
        Self {
            config,
            rpc,
            identity,
            directory,
            handshake,
            transport,
            consolidator,
            ledger,
            events,
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn identity(&self) -> Result<Option<Identity>, EngineError> {
        self.identity.load().await
    }

    pub async fn create_identity(&self, username: &str) -> Result<Identity, EngineError> {
        self.identity.create(username).await
    }

    pub async fn import_identity(
        &self,
        username: &str,
        private_key: &str,
    ) -> Result<Identity, EngineError> {
        self.identity.import(username, private_key).await
    }

    pub async fn rename_identity(&self, new_username: &str) -> Result<Identity, EngineError> {
        self.identity.rename(new_username).await
    }

    pub async fn send_contact_request(&self, peer_address: &str) -> Result<Token, EngineError> {
        let identity = self.require_identity().await?;
        self.handshake.send_request(&identity, peer_address).await
    }

    pub async fn confirm_contact(&self, their_token: &Token) -> Result<Contact, EngineError> {
        let identity = self.require_identity().await?;
        self.handshake.confirm(&identity, their_token).await
    }

    pub async fn reject_contact(&self, their_token: &Token) -> Result<(), EngineError> {
        self.handshake.reject(their_token).await
    }

    pub async fn delete_contact(&self, their_token: &Token) -> Result<(), EngineError> {
        if self.directory.contact_by_token(their_token).await.is_none() {
            return Err(EngineError::UnknownContact);
        }
        self.directory.delete_contact(their_token).await
    }

    pub async fn contacts(&self) -> Vec<Contact> {
        self.directory.contacts().await
    }

    pub async fn pending_contacts(&self) -> Vec<PendingContact> {
        self.directory.pending().await
    }

    pub async fn outgoing_requests(&self) -> Vec<OutgoingRequest> {
        self.directory.requests().await
    }

    pub async fn banned_addresses(&self) -> Vec<String> {
        self.directory.banned().await
    }

    pub async fn send_message(
        &self,
        their_token: &Token,
        text: &str,
    ) -> Result<ChatMessage, EngineError> {
        self.send_message_with_gift(their_token, text, 0).await
    }

    /// A gift rides on the same message transaction as extra value beyond
    /// the dust amount.
    pub async fn send_message_with_gift(
        &self,
        their_token: &Token,
        text: &str,
        gift: u64,
    ) -> Result<ChatMessage, EngineError> {
        let identity = self.require_identity().await?;
        self.transport.send(&identity, their_token, text, gift).await
    }

    pub async fn set_active_contact(&self, their_token: Option<Token>) {
        self.transport.set_active(their_token).await;
    }

    pub async fn open_conversation(&self, their_token: &Token) -> Result<Conversation, EngineError> {
        self.transport.open(their_token).await
    }

    pub async fn load_older(&self, their_token: &Token, before: u64) -> Vec<ChatMessage> {
        self.transport.older(their_token, before).await
    }

    pub async fn load_newer(
        &self,
        their_token: &Token,
        last_seen: u64,
    ) -> Result<Vec<ChatMessage>, EngineError> {
        self.transport.newer(their_token, last_seen).await
    }

    pub async fn has_unread(&self, their_token: &Token) -> bool {
        self.transport.has_unread(their_token).await
    }

    /// One inbound cycle: list unspent notes at the messaging address,
    /// route every transaction not yet seen, then check whether the note
    /// set needs consolidating. Without an identity there is nothing to
    /// poll.
    pub async fn poll_once(&self) -> Result<(), EngineError> {
        let Some(identity) = self.identity.load().await? else {
            return Ok(());
        };
        let notes = self
            .rpc
            .list_unspent(&identity.address, self.config.min_conf)
            .await
            .map_err(|e| EngineError::Rpc(e.to_string()))?;
        for note in &notes {
            if self.ledger.is_processed(&note.txid).await? {
                continue;
            }
            self.route(note).await?;
            self.ledger.mark_processed(&note.txid).await?;
        }
        self.consolidator.maybe_merge(&identity, notes.len()).await?;
        Ok(())
    }

    async fn route(&self, note: &Unspent) -> Result<(), EngineError> {
        match memo::decode(&note.memo_hex) {
            Ok(MemoPayload::Request {
                category,
                id,
                username,
                address,
            }) => {
                self.handshake
                    .handle_request(&category, &id, &username, &address)
                    .await
            }
            Ok(MemoPayload::Identity {
                category,
                id,
                username,
                address,
            }) => {
                self.handshake
                    .handle_identity(&category, &id, &username, &address)
                    .await
            }
            Ok(MemoPayload::Message {
                id,
                username,
                text,
                timestamp,
            }) => {
                self.transport
                    .handle_message(&id, &username, &text, timestamp, note.amount)
                    .await
            }
            Ok(MemoPayload::Merge) => {
                log::debug!("merge note {} landed", note.txid);
                Ok(())
            }
            Err(err) => {
                // Foreign or malformed transactions never block the loop;
                // the funds are still reported.
                log::warn!(
                    "transaction {} carried no readable payload ({err}), recording value receipt",
                    note.txid
                );
                self.events.publish(EngineEvent::ValueReceived {
                    txid: note.txid.clone(),
                    amount: note.amount,
                });
                Ok(())
            }
        }
    }

    /// Spawn the background poll loop. Aborting the handle stops it.
    pub fn start_poller(&self) -> JoinHandle<()> {
        let engine = self.clone();
        let interval = Duration::from_millis(engine.config.poll_interval_ms);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(err) = engine.poll_once().await {
                    log::warn!("poll cycle failed: {err}");
                }
            }
        })
    }

    async fn require_identity(&self) -> Result<Identity, EngineError> {
        self.identity.load().await?.ok_or(EngineError::NoIdentity)
    }
}

#[cfg(test)]
mod tests;
