use memochat_api::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("submission rejected: {0}")]
    Submission(String),
    #[error("operation failed: {0}")]
    Operation(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("destination is already a contact")]
    AlreadyContact,
    #[error("contact request already sent to this address")]
    AlreadyRequested,
    #[error("address already has a pending inbound request")]
    AlreadyPending,
    #[error("no contact for token")]
    UnknownContact,
    #[error("no pending request for token")]
    UnknownPending,
    #[error("messaging identity not created yet")]
    NoIdentity,
    #[error("messaging identity already exists")]
    IdentityExists,
    #[error("username unchanged")]
    DuplicateUsername,
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("address generation failed: {0}")]
    AddressGeneration(String),
    #[error("payload encoding failed")]
    Encode,
    #[error("storage")]
    Storage,
    #[error("rpc: {0}")]
    Rpc(String),
}
