use crate::error::EngineError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
#[error("record store failure")]
pub struct StoreError;

/// Keyed byte-record store the engine persists through. Single-record
/// atomicity is all the engine relies on.
pub trait RecordStore: Send {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
}

pub type SharedStore = Arc<Mutex<dyn RecordStore>>;

pub fn shared(store: impl RecordStore + 'static) -> SharedStore {
    Arc::new(Mutex::new(store))
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.records.remove(key);
        Ok(())
    }
}

pub(crate) fn get_json<T: DeserializeOwned>(store: &dyn RecordStore, key: &str) -> Option<T> {
    store
        .get(key)
        .ok()
        .flatten()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
}

pub(crate) fn put_json<T: Serialize>(
    store: &mut dyn RecordStore,
    key: &str,
    value: &T,
) -> Result<(), EngineError> {
    let bytes = serde_json::to_vec(value).map_err(|_| EngineError::Storage)?;
    store.put(key, &bytes).map_err(|_| EngineError::Storage)
}

/// Index sets live under a fixed key next to the records they point at.
pub(crate) fn load_index(
    store: &dyn RecordStore,
    key: &str,
) -> Result<HashSet<String>, EngineError> {
    if let Some(bytes) = store.get(key).map_err(|_| EngineError::Storage)? {
        serde_json::from_slice(&bytes).map_err(|_| EngineError::Storage)
    } else {
        Ok(HashSet::new())
    }
}
