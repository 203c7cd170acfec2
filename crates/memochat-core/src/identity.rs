use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::rpc::WalletRpc;
use crate::store::SharedStore;
use memochat_api::validation::validate_username;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const IDENTITY_KEY: &str = "identity";

/// This wallet's messaging identity. One per wallet instance; the private
/// key is written once and never rotated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub category: String,
    pub username: String,
    pub address: String,
    pub private_key: String,
}

#[derive(Clone)]
pub struct IdentityStore {
    store: SharedStore,
    rpc: Arc<dyn WalletRpc>,
    config: EngineConfig,
}

impl IdentityStore {
    pub fn new(store: SharedStore, rpc: Arc<dyn WalletRpc>, config: EngineConfig) -> Self {
        Self { store, rpc, config }
    }

    pub async fn load(&self) -> Result<Option<Identity>, EngineError> {
        let guard = self.store.lock().await;
        let Some(bytes) = guard.get(IDENTITY_KEY).map_err(|_| EngineError::Storage)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|_| EngineError::Storage)
    }

    /// Mint a fresh address for messaging and persist the identity record.
    pub async fn create(&self, username: &str) -> Result<Identity, EngineError> {
        validate_username(username, &self.config.limits)?;
        if self.load().await?.is_some() {
            return Err(EngineError::IdentityExists);
        }
        let address = self
            .rpc
            .get_new_address()
            .await
            .map_err(|e| EngineError::AddressGeneration(e.to_string()))?;
        let private_key = self
            .rpc
            .export_key(&address)
            .await
            .map_err(|e| EngineError::AddressGeneration(e.to_string()))?;
        let identity = Identity {
            category: self.config.category.clone(),
            username: username.to_string(),
            address,
            private_key,
        };
        self.persist(&identity).await?;
        Ok(identity)
    }

    /// Restore an identity from a previously exported key.
    pub async fn import(&self, username: &str, private_key: &str) -> Result<Identity, EngineError> {
        validate_username(username, &self.config.limits)?;
        if self.load().await?.is_some() {
            return Err(EngineError::IdentityExists);
        }
        let address = self
            .rpc
            .import_private_key(private_key)
            .await
            .map_err(|e| EngineError::AddressGeneration(e.to_string()))?;
        let identity = Identity {
            category: self.config.category.clone(),
            username: username.to_string(),
            address,
            private_key: private_key.to_string(),
        };
        self.persist(&identity).await?;
        Ok(identity)
    }

    /// Peers learn the new name from the `author` field of later messages;
    /// nothing is pushed on rename.
    pub async fn rename(&self, new_username: &str) -> Result<Identity, EngineError> {
        validate_username(new_username, &self.config.limits)?;
        let mut identity = self.load().await?.ok_or(EngineError::NoIdentity)?;
        if identity.username == new_username {
            return Err(EngineError::DuplicateUsername);
        }
        identity.username = new_username.to_string();
        self.persist(&identity).await?;
        Ok(identity)
    }

    async fn persist(&self, identity: &Identity) -> Result<(), EngineError> {
        let bytes = serde_json::to_vec(identity).map_err(|_| EngineError::Storage)?;
        let mut guard = self.store.lock().await;
        guard
            .put(IDENTITY_KEY, &bytes)
            .map_err(|_| EngineError::Storage)
    }
}
