use crate::token::Token;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload carried in a transaction memo. The `type` field discriminates
/// on the wire; anything that fails to parse into one of these shapes is a
/// plain-value receipt, not a protocol event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MemoPayload {
    Request {
        category: String,
        id: Token,
        username: String,
        address: String,
    },
    Identity {
        category: String,
        id: Token,
        username: String,
        address: String,
    },
    Message {
        id: Token,
        username: String,
        text: String,
        timestamp: u64,
    },
    Merge,
}

/// Non-fatal: the transaction still gets marked processed and the poll
/// loop continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("memo is not valid hex")]
    Hex(#[from] hex::FromHexError),
    #[error("memo is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("memo is not valid json")]
    Json(#[from] serde_json::Error),
    #[error("memo json is not an object")]
    NotObject,
}

pub fn encode(payload: &MemoPayload) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(payload)?;
    Ok(hex::encode(json.as_bytes()))
}

/// Byte length of the memo a payload encodes to, before NUL padding.
pub fn encoded_len(payload: &MemoPayload) -> Result<usize, serde_json::Error> {
    Ok(serde_json::to_string(payload)?.len())
}

pub fn decode(memo_hex: &str) -> Result<MemoPayload, DecodeError> {
    let bytes = hex::decode(memo_hex.trim())?;
    let mut text = String::from_utf8(bytes)?;
    // The transport pads memos to a fixed width with NULs.
    while text.ends_with('\u{0}') {
        text.pop();
    }
    let value: serde_json::Value = serde_json::from_str(&text)?;
    if !value.is_object() {
        return Err(DecodeError::NotObject);
    }
    Ok(serde_json::from_value(value)?)
}
