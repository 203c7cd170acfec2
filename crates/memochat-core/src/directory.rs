use crate::error::EngineError;
use crate::store::{get_json, load_index, put_json, SharedStore};
use crate::token::Token;
use serde::{Deserialize, Serialize};

const CONTACT_INDEX: &str = "contacts:index";
const PENDING_INDEX: &str = "pending:index";
const REQUEST_INDEX: &str = "requests:index";
const BANNED_KEY: &str = "banned";

/// An established relationship. `my_token` was minted by this wallet and
/// labels our outgoing messages; `their_token` was minted by the peer and
/// routes their inbound messages to this record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub category: String,
    pub my_token: Token,
    pub their_token: Token,
    pub username: String,
    pub address: String,
    pub added_at_ms: u64,
}

/// Inbound contact request awaiting manual confirm/reject.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingContact {
    pub category: String,
    pub their_token: Token,
    pub username: String,
    pub address: String,
}

/// Outbound request whose identity-ack has not arrived yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingRequest {
    pub my_token: Token,
    pub peer_address: String,
}

#[derive(Clone)]
pub struct ContactDirectory {
    store: SharedStore,
}

impl ContactDirectory {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn add_contact(&self, contact: &Contact) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut index = load_index(&*guard, CONTACT_INDEX)?;
        index.insert(contact.their_token.to_string());
        put_json(&mut *guard, &contact_key(&contact.their_token), contact)?;
        put_json(&mut *guard, CONTACT_INDEX, &index)
    }

    pub async fn contact_by_token(&self, their_token: &Token) -> Option<Contact> {
        let guard = self.store.lock().await;
        get_json(&*guard, &contact_key(their_token))
    }

    pub async fn contact_by_address(&self, address: &str) -> Option<Contact> {
        self.contacts()
            .await
            .into_iter()
            .find(|c| c.address == address)
    }

    pub async fn contacts(&self) -> Vec<Contact> {
        let guard = self.store.lock().await;
        let index = load_index(&*guard, CONTACT_INDEX).unwrap_or_default();
        let mut contacts: Vec<Contact> = index
            .iter()
            .filter_map(|token| get_json(&*guard, &contact_key(&Token::new(token.clone()))))
            .collect();
        contacts.sort_by(|a, b| a.username.cmp(&b.username));
        contacts
    }

    pub async fn update_username(
        &self,
        their_token: &Token,
        username: &str,
    ) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let Some(mut contact) = get_json::<Contact>(&*guard, &contact_key(their_token)) else {
            return Err(EngineError::UnknownContact);
        };
        contact.username = username.to_string();
        put_json(&mut *guard, &contact_key(their_token), &contact)
    }

    pub async fn delete_contact(&self, their_token: &Token) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut index = load_index(&*guard, CONTACT_INDEX)?;
        index.remove(their_token.as_str());
        guard
            .delete(&contact_key(their_token))
            .map_err(|_| EngineError::Storage)?;
        put_json(&mut *guard, CONTACT_INDEX, &index)
    }

    pub async fn add_pending(&self, pending: &PendingContact) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut index = load_index(&*guard, PENDING_INDEX)?;
        index.insert(pending.their_token.to_string());
        put_json(&mut *guard, &pending_key(&pending.their_token), pending)?;
        put_json(&mut *guard, PENDING_INDEX, &index)
    }

    pub async fn pending_by_token(&self, their_token: &Token) -> Option<PendingContact> {
        let guard = self.store.lock().await;
        get_json(&*guard, &pending_key(their_token))
    }

    pub async fn pending_by_address(&self, address: &str) -> Option<PendingContact> {
        self.pending()
            .await
            .into_iter()
            .find(|p| p.address == address)
    }

    pub async fn pending(&self) -> Vec<PendingContact> {
        let guard = self.store.lock().await;
        let index = load_index(&*guard, PENDING_INDEX).unwrap_or_default();
        index
            .iter()
            .filter_map(|token| get_json(&*guard, &pending_key(&Token::new(token.clone()))))
            .collect()
    }

    pub async fn delete_pending(&self, their_token: &Token) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut index = load_index(&*guard, PENDING_INDEX)?;
        index.remove(their_token.as_str());
        guard
            .delete(&pending_key(their_token))
            .map_err(|_| EngineError::Storage)?;
        put_json(&mut *guard, PENDING_INDEX, &index)
    }

    pub async fn add_request(&self, request: &OutgoingRequest) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut index = load_index(&*guard, REQUEST_INDEX)?;
        index.insert(request.peer_address.clone());
        put_json(&mut *guard, &request_key(&request.peer_address), request)?;
        put_json(&mut *guard, REQUEST_INDEX, &index)
    }

    pub async fn request_by_address(&self, address: &str) -> Option<OutgoingRequest> {
        let guard = self.store.lock().await;
        get_json(&*guard, &request_key(address))
    }

    pub async fn requests(&self) -> Vec<OutgoingRequest> {
        let guard = self.store.lock().await;
        let index = load_index(&*guard, REQUEST_INDEX).unwrap_or_default();
        index
            .iter()
            .filter_map(|address| get_json(&*guard, &request_key(address)))
            .collect()
    }

    pub async fn delete_request(&self, address: &str) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut index = load_index(&*guard, REQUEST_INDEX)?;
        index.remove(address);
        guard
            .delete(&request_key(address))
            .map_err(|_| EngineError::Storage)?;
        put_json(&mut *guard, REQUEST_INDEX, &index)
    }

    pub async fn ban(&self, address: &str) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut banned = load_index(&*guard, BANNED_KEY)?;
        banned.insert(address.to_string());
        put_json(&mut *guard, BANNED_KEY, &banned)
    }

    pub async fn is_banned(&self, address: &str) -> bool {
        let guard = self.store.lock().await;
        load_index(&*guard, BANNED_KEY)
            .map(|b| b.contains(address))
            .unwrap_or(false)
    }

    pub async fn banned(&self) -> Vec<String> {
        let guard = self.store.lock().await;
        let mut banned: Vec<String> = load_index(&*guard, BANNED_KEY)
            .unwrap_or_default()
            .into_iter()
            .collect();
        banned.sort();
        banned
    }
}

fn contact_key(their_token: &Token) -> String {
    format!("contact:{}", their_token)
}

fn pending_key(their_token: &Token) -> String {
    format!("pending:{}", their_token)
}

fn request_key(address: &str) -> String {
    format!("request:{}", address)
}
