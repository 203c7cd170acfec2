use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactDto {
    pub category: String,
    pub my_token: String,
    pub their_token: String,
    pub username: String,
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PendingContactDto {
    pub category: String,
    pub their_token: String,
    pub username: String,
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessageDto {
    pub their_token: String,
    pub author: String,
    pub text: String,
    pub amount: u64,
    pub timestamp: u64,
    pub unread: bool,
}

/// Events published by the engine for the embedding UI. Decode failures and
/// foreign transactions surface as `ValueReceived` so funds landing on the
/// messaging address are never silently dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum EngineEvent {
    MessageReceived(ChatMessageDto),
    ContactRequested(PendingContactDto),
    ContactAdded(ContactDto),
    ContactRenamed { their_token: String, username: String },
    ValueReceived { txid: String, amount: u64 },
    NotesMerged { txid: String, amount: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationLimits {
    pub max_text_bytes: usize,
    pub max_username_len: usize,
    pub token_len: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_text_bytes: 400,
            max_username_len: 64,
            token_len: 32,
        }
    }
}
