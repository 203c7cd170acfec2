use crate::config::EngineConfig;
use crate::directory::ContactDirectory;
use crate::error::EngineError;
use crate::event::EventBus;
use crate::identity::Identity;
use crate::memo::{self, MemoPayload};
use crate::monitor::OperationMonitor;
use crate::rpc::WalletRpc;
use crate::store::{get_json, put_json, SharedStore};
use crate::token::Token;
use memochat_api::types::{ChatMessageDto, EngineEvent};
use memochat_api::validation::{validate_message_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Author label for messages this wallet sent.
pub const SELF_AUTHOR: &str = "you";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub their_token: Token,
    pub author: String,
    pub text: String,
    pub amount: u64,
    pub timestamp: u64,
}

impl ChatMessage {
    /// Value carried beyond the dust floor is a gift riding on the message.
    pub fn gift_amount(&self, dust: u64) -> Option<u64> {
        (self.amount > dust).then(|| self.amount - dust)
    }
}

/// What opening a contact shows: the most recent read messages (newest
/// first) and the oldest unread ones (oldest first).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation {
    pub read: Vec<ChatMessage>,
    pub unread: Vec<ChatMessage>,
}

/// Read and unread message records, per contact, ordered by timestamp.
#[derive(Clone)]
pub struct MessageStore {
    store: SharedStore,
}

impl MessageStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn append_read(&self, message: &ChatMessage) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut index = load_ts_index(&*guard, &read_index_key(&message.their_token))?;
        index.insert(message.timestamp);
        put_json(
            &mut *guard,
            &read_key(&message.their_token, message.timestamp),
            message,
        )?;
        put_json(&mut *guard, &read_index_key(&message.their_token), &index)
    }

    pub async fn append_unread(&self, message: &ChatMessage) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut index = load_ts_index(&*guard, &unread_index_key(&message.their_token))?;
        index.insert(message.timestamp);
        put_json(
            &mut *guard,
            &unread_key(&message.their_token, message.timestamp),
            message,
        )?;
        put_json(&mut *guard, &unread_index_key(&message.their_token), &index)
    }

    /// Read messages strictly older than `before` (all when `None`), newest
    /// first, at most `limit`.
    pub async fn read_before(
        &self,
        their_token: &Token,
        before: Option<u64>,
        limit: usize,
    ) -> Vec<ChatMessage> {
        let guard = self.store.lock().await;
        let index = load_ts_index(&*guard, &read_index_key(their_token)).unwrap_or_default();
        index
            .iter()
            .rev()
            .filter(|ts| before.map(|b| **ts < b).unwrap_or(true))
            .take(limit)
            .filter_map(|ts| get_json(&*guard, &read_key(their_token, *ts)))
            .collect()
    }

    /// Unread messages strictly newer than `after` (all when `None`), oldest
    /// first, at most `limit`.
    pub async fn unread_after(
        &self,
        their_token: &Token,
        after: Option<u64>,
        limit: usize,
    ) -> Vec<ChatMessage> {
        let guard = self.store.lock().await;
        let index = load_ts_index(&*guard, &unread_index_key(their_token)).unwrap_or_default();
        index
            .iter()
            .filter(|ts| after.map(|a| **ts > a).unwrap_or(true))
            .take(limit)
            .filter_map(|ts| get_json(&*guard, &unread_key(their_token, *ts)))
            .collect()
    }

    /// Move every unread message with timestamp <= `up_to` into the read
    /// store (the UI has scrolled through them).
    pub async fn mark_read_up_to(
        &self,
        their_token: &Token,
        up_to: u64,
    ) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut unread_index = load_ts_index(&*guard, &unread_index_key(their_token))?;
        let mut read_index = load_ts_index(&*guard, &read_index_key(their_token))?;
        let promoted: Vec<u64> = unread_index.range(..=up_to).copied().collect();
        for ts in &promoted {
            let Some(message) = get_json::<ChatMessage>(&*guard, &unread_key(their_token, *ts))
            else {
                continue;
            };
            put_json(&mut *guard, &read_key(their_token, *ts), &message)?;
            guard
                .delete(&unread_key(their_token, *ts))
                .map_err(|_| EngineError::Storage)?;
            unread_index.remove(ts);
            read_index.insert(*ts);
        }
        put_json(&mut *guard, &unread_index_key(their_token), &unread_index)?;
        put_json(&mut *guard, &read_index_key(their_token), &read_index)
    }

    pub async fn unread_count(&self, their_token: &Token) -> usize {
        let guard = self.store.lock().await;
        load_ts_index(&*guard, &unread_index_key(their_token))
            .map(|i| i.len())
            .unwrap_or(0)
    }
}

#[derive(Default)]
struct SessionState {
    /// Every timestamp observed this session; collisions bump against this
    /// set so the ordering key stays unique.
    seen: BTreeSet<u64>,
    active: Option<Token>,
}

/// Sends and receives chat messages over the memo rails and owns the
/// read/unread split.
#[derive(Clone)]
pub struct MessageTransport {
    directory: ContactDirectory,
    messages: MessageStore,
    monitor: OperationMonitor,
    rpc: Arc<dyn WalletRpc>,
    events: EventBus,
    config: EngineConfig,
    session: Arc<Mutex<SessionState>>,
}

impl MessageTransport {
    pub fn new(
        directory: ContactDirectory,
        messages: MessageStore,
        monitor: OperationMonitor,
        rpc: Arc<dyn WalletRpc>,
        events: EventBus,
        config: EngineConfig,
    ) -> Self {
        Self {
            directory,
            messages,
            monitor,
            rpc,
            events,
            config,
            session: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Mark which contact's conversation is open; inbound messages for it
    /// land directly in the read store.
    pub async fn set_active(&self, their_token: Option<Token>) {
        self.session.lock().await.active = their_token;
    }

    pub async fn send(
        &self,
        identity: &Identity,
        their_token: &Token,
        text: &str,
        gift: u64,
    ) -> Result<ChatMessage, EngineError> {
        let contact = self
            .directory
            .contact_by_token(their_token)
            .await
            .ok_or(EngineError::UnknownContact)?;
        validate_message_text(text, &self.config.limits)?;
        let mediantime = self
            .rpc
            .chain_info()
            .await
            .map_err(|e| EngineError::Rpc(e.to_string()))?
            .mediantime;
        let timestamp = self.claim_timestamp(mediantime).await;
        let payload = MemoPayload::Message {
            id: contact.my_token.clone(),
            username: identity.username.clone(),
            text: text.to_string(),
            timestamp,
        };
        if memo::encoded_len(&payload).map_err(|_| EngineError::Encode)? > self.config.memo_width {
            return Err(ValidationError::TooLong("memo").into());
        }
        let memo_hex = memo::encode(&payload).map_err(|_| EngineError::Encode)?;
        let amount = self.config.dust + gift;
        self.monitor
            .send(
                &identity.address,
                &contact.address,
                amount,
                self.config.fee,
                &memo_hex,
            )
            .await?;
        let message = ChatMessage {
            their_token: contact.their_token.clone(),
            author: SELF_AUTHOR.to_string(),
            text: text.to_string(),
            amount,
            timestamp,
        };
        self.messages.append_read(&message).await?;
        Ok(message)
    }

    /// Route one inbound message memo. Unknown tokens are not a
    /// relationship we hold and are dropped without error.
    pub async fn handle_message(
        &self,
        id: &Token,
        username: &str,
        text: &str,
        timestamp: u64,
        amount: u64,
    ) -> Result<(), EngineError> {
        let Some(contact) = self.directory.contact_by_token(id).await else {
            log::debug!("message memo for unknown token {id}, dropping");
            return Ok(());
        };
        if contact.username != username {
            // Peers rename themselves through the author field.
            self.directory
                .update_username(&contact.their_token, username)
                .await?;
            self.events.publish(EngineEvent::ContactRenamed {
                their_token: contact.their_token.to_string(),
                username: username.to_string(),
            });
        }
        let timestamp = self.claim_timestamp(timestamp).await;
        let message = ChatMessage {
            their_token: contact.their_token.clone(),
            author: username.to_string(),
            text: text.to_string(),
            amount,
            timestamp,
        };
        let active = self.session.lock().await.active.clone();
        let unread = active.as_ref() != Some(&contact.their_token);
        if unread {
            self.messages.append_unread(&message).await?;
        } else {
            self.messages.append_read(&message).await?;
        }
        self.events
            .publish(EngineEvent::MessageReceived(to_dto(&message, unread)));
        Ok(())
    }

    /// Load the page a freshly opened conversation shows.
    pub async fn open(&self, their_token: &Token) -> Result<Conversation, EngineError> {
        if self.directory.contact_by_token(their_token).await.is_none() {
            return Err(EngineError::UnknownContact);
        }
        let read = self
            .messages
            .read_before(their_token, None, self.config.page_size)
            .await;
        let unread = self
            .messages
            .unread_after(their_token, None, self.config.page_size)
            .await;
        Ok(Conversation { read, unread })
    }

    /// Scroll toward history: the next page of read messages strictly older
    /// than the last one on screen.
    pub async fn older(&self, their_token: &Token, before: u64) -> Vec<ChatMessage> {
        self.messages
            .read_before(their_token, Some(before), self.config.page_size)
            .await
    }

    /// Scroll toward the present: everything up to `last_seen` becomes
    /// read, and the next page of unread past it comes back.
    pub async fn newer(
        &self,
        their_token: &Token,
        last_seen: u64,
    ) -> Result<Vec<ChatMessage>, EngineError> {
        self.messages.mark_read_up_to(their_token, last_seen).await?;
        Ok(self
            .messages
            .unread_after(their_token, Some(last_seen), self.config.page_size)
            .await)
    }

    pub async fn has_unread(&self, their_token: &Token) -> bool {
        self.messages.unread_count(their_token).await > 0
    }

    /// Session-unique ordering key: a collision with any timestamp already
    /// seen this session bumps to max(seen)+1.
    async fn claim_timestamp(&self, proposed: u64) -> u64 {
        let mut session = self.session.lock().await;
        let claimed = if session.seen.contains(&proposed) {
            session.seen.iter().next_back().copied().unwrap_or(proposed) + 1
        } else {
            proposed
        };
        session.seen.insert(claimed);
        claimed
    }
}

pub(crate) fn to_dto(message: &ChatMessage, unread: bool) -> ChatMessageDto {
    ChatMessageDto {
        their_token: message.their_token.to_string(),
        author: message.author.clone(),
        text: message.text.clone(),
        amount: message.amount,
        timestamp: message.timestamp,
        unread,
    }
}

fn read_index_key(their_token: &Token) -> String {
    format!("msgs:{}", their_token)
}

fn read_key(their_token: &Token, timestamp: u64) -> String {
    format!("msg:{}:{}", their_token, timestamp)
}

fn unread_index_key(their_token: &Token) -> String {
    format!("unread:{}", their_token)
}

fn unread_key(their_token: &Token, timestamp: u64) -> String {
    format!("unreadmsg:{}:{}", their_token, timestamp)
}

fn load_ts_index(
    store: &dyn crate::store::RecordStore,
    key: &str,
) -> Result<BTreeSet<u64>, EngineError> {
    if let Some(bytes) = store.get(key).map_err(|_| EngineError::Storage)? {
        serde_json::from_slice(&bytes).map_err(|_| EngineError::Storage)
    } else {
        Ok(BTreeSet::new())
    }
}
