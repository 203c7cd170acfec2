use crate::types::ValidationLimits;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("empty field {0}")]
    Empty(&'static str),
    #[error("too long {0}")]
    TooLong(&'static str),
    #[error("invalid {0}")]
    Invalid(&'static str),
}

pub fn validate_username(username: &str, limits: &ValidationLimits) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::Empty("username"));
    }
    if username.len() > limits.max_username_len {
        return Err(ValidationError::TooLong("username"));
    }
    Ok(())
}

pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::Empty("address"));
    }
    let len = address.len();
    if !(20..=128).contains(&len) {
        return Err(ValidationError::Invalid("address"));
    }
    if !address.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::Invalid("address"));
    }
    Ok(())
}

pub fn validate_token(token: &str, limits: &ValidationLimits) -> Result<(), ValidationError> {
    if token.len() != limits.token_len {
        return Err(ValidationError::Invalid("token"));
    }
    if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::Invalid("token"));
    }
    Ok(())
}

pub fn validate_message_text(text: &str, limits: &ValidationLimits) -> Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::Empty("text"));
    }
    if text.len() > limits.max_text_bytes {
        return Err(ValidationError::TooLong("text"));
    }
    Ok(())
}
