use crate::error::EngineError;
use crate::store::{load_index, put_json, SharedStore};

const PROCESSED_KEY: &str = "tx:processed";

/// Set of transaction ids the engine has already interpreted. Every decoded
/// transaction, valid or not, lands here exactly once; our own confirmed
/// sends are added before their memos could ever be re-read.
#[derive(Clone)]
pub struct TxLedger {
    store: SharedStore,
}

impl TxLedger {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn is_processed(&self, txid: &str) -> Result<bool, EngineError> {
        let guard = self.store.lock().await;
        Ok(load_index(&*guard, PROCESSED_KEY)?.contains(txid))
    }

    pub async fn mark_processed(&self, txid: &str) -> Result<(), EngineError> {
        let mut guard = self.store.lock().await;
        let mut set = load_index(&*guard, PROCESSED_KEY)?;
        if set.insert(txid.to_string()) {
            put_json(&mut *guard, PROCESSED_KEY, &set)?;
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        let guard = self.store.lock().await;
        load_index(&*guard, PROCESSED_KEY)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}
