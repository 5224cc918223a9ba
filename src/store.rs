use crate::{
    records::UnifiedRecord,
    storage::{BackendLocal, StorageManager},
};
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::{Arc, RwLock},
    thread::sleep,
    time::Duration,
};

const HISTORY_BLOB: &str = "history.json";

const MAX_INIT_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable after {retries} attempts: {source}")]
    Unavailable {
        retries: u32,
        source: std::io::Error,
    },

    #[error("io error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("store blob is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Persistence boundary for the unified record set. One list plus one count
/// under stable keys; the engine has no file-format knowledge beyond this.
pub trait HistoryStore: Send + Sync {
    fn get_all(&self) -> Result<Vec<UnifiedRecord>, StoreError>;
    fn save(&self, records: &[UnifiedRecord]) -> Result<usize, StoreError>;
    fn count(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HistoryBlob {
    #[serde(default)]
    saved_history: Vec<UnifiedRecord>,
    #[serde(default)]
    history_count: usize,
}

/// JSON blob store over a [`StorageManager`], list cached in memory.
#[derive(Clone)]
pub struct BackendJson {
    blob_store: Arc<dyn StorageManager>,
    blob: Arc<RwLock<HistoryBlob>>,
}

impl BackendJson {
    pub fn load(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let blob_store = Arc::new(open_with_retries(base_dir.as_ref())?);
        Self::load_with(blob_store)
    }

    pub fn load_with(blob_store: Arc<dyn StorageManager>) -> Result<Self, StoreError> {
        if !blob_store.exists(HISTORY_BLOB) {
            log::info!("creating new history store");
            let empty = serde_json::to_vec(&HistoryBlob::default())?;
            blob_store.write(HISTORY_BLOB, &empty)?;
        }

        let blob: HistoryBlob = serde_json::from_slice(&blob_store.read(HISTORY_BLOB)?)?;
        log::info!("loaded {} history records", blob.saved_history.len());

        Ok(BackendJson {
            blob_store,
            blob: Arc::new(RwLock::new(blob)),
        })
    }

    fn persist(&self, blob: &HistoryBlob) -> Result<(), StoreError> {
        let data = serde_json::to_vec(blob)?;
        self.blob_store.write(HISTORY_BLOB, &data)?;
        Ok(())
    }
}

impl HistoryStore for BackendJson {
    fn get_all(&self) -> Result<Vec<UnifiedRecord>, StoreError> {
        let blob = self.blob.read().unwrap();

        let mut records = Vec::with_capacity(blob.saved_history.len());
        let mut dropped = 0;
        for record in blob.saved_history.iter() {
            if record.url.is_empty() || record.title.is_empty() {
                dropped += 1;
                continue;
            }
            records.push(record.clone());
        }

        if dropped > 0 {
            log::warn!("filtered out {dropped} invalid history records");
        }

        Ok(records)
    }

    fn save(&self, records: &[UnifiedRecord]) -> Result<usize, StoreError> {
        let mut blob = self.blob.write().unwrap();
        blob.saved_history = records.to_vec();
        blob.history_count = records.len();

        self.persist(&blob)?;
        log::debug!("saved {} history records", blob.history_count);

        Ok(blob.history_count)
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.blob.read().unwrap().history_count)
    }
}

fn open_with_retries(base_dir: &Path) -> Result<BackendLocal, StoreError> {
    let mut attempt = 0;
    loop {
        match BackendLocal::new(base_dir) {
            Ok(store) => return Ok(store),
            Err(err) if attempt + 1 < MAX_INIT_RETRIES => {
                attempt += 1;
                log::warn!(
                    "store not available, retry attempt {attempt}/{MAX_INIT_RETRIES}: {err}"
                );
                sleep(RETRY_DELAY);
            }
            Err(err) => {
                return Err(StoreError::Unavailable {
                    retries: MAX_INIT_RETRIES,
                    source: err,
                })
            }
        }
    }
}
