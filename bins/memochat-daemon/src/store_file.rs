use memochat_core::store::{RecordStore, StoreError};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Plain JSON-file record store so the daemon's protocol state survives
/// restarts. Records are hex-encoded byte strings under their keys; every
/// mutation rewrites the file (write volume is human-paced).
pub struct FileStore {
    path: PathBuf,
    records: HashMap<String, String>,
}

impl FileStore {
    pub fn open(path: PathBuf) -> io::Result<Self> {
        let records = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err),
        };
        Ok(Self { path, records })
    }

    fn flush(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&self.records).map_err(|_| StoreError)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(|_| StoreError)?;
        fs::rename(&tmp, &self.path).map_err(|_| StoreError)
    }
}

impl RecordStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.records.get(key) {
            Some(value) => hex::decode(value).map(Some).map_err(|_| StoreError),
            None => Ok(None),
        }
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), hex::encode(value));
        self.flush()
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        if self.records.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
