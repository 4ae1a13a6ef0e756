//! Selection history stores

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::StoreError;
use crate::store::{open_lock, write_atomic};

const HISTORY_FILE: &str = "selection_history.json";
const HISTORY_LOCK: &str = "selection_history.lock";

/// Preset name -> recent selections, most recent first
pub type HistoryMap = BTreeMap<String, Vec<String>>;

/// Whole-map persistence for selection history
pub trait HistoryStore {
    /// Load the full history map
    fn load(&self) -> Result<HistoryMap, StoreError>;

    /// Replace the stored map
    fn save(&mut self, history: &HistoryMap) -> Result<(), StoreError>;
}

impl<S: HistoryStore + ?Sized> HistoryStore for Box<S> {
    fn load(&self) -> Result<HistoryMap, StoreError> {
        (**self).load()
    }

    fn save(&mut self, history: &HistoryMap) -> Result<(), StoreError> {
        (**self).save(history)
    }
}

/// In-memory history store
#[derive(Debug, Default, Clone)]
pub struct MemoryHistoryStore {
    history: HistoryMap,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: HistoryMap) -> Self {
        Self { history }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<HistoryMap, StoreError> {
        Ok(self.history.clone())
    }

    fn save(&mut self, history: &HistoryMap) -> Result<(), StoreError> {
        self.history = history.clone();
        Ok(())
    }
}

/// History store backed by a single JSON file
pub struct JsonHistoryStore {
    base_path: PathBuf,
}

impl JsonHistoryStore {
    /// Open or create a history store in the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|source| StoreError::Unavailable {
            path: base_path.clone(),
            source,
        })?;
        debug!(?base_path, "Opened selection history store");
        Ok(Self { base_path })
    }

    /// Path of the history file
    pub fn history_file(&self) -> PathBuf {
        self.base_path.join(HISTORY_FILE)
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Result<HistoryMap, StoreError> {
        let path = self.history_file();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HistoryMap::new()),
            Err(source) => return Err(StoreError::Unavailable { path, source }),
        };

        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            location: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn save(&mut self, history: &HistoryMap) -> Result<(), StoreError> {
        let lock = open_lock(&self.base_path.join(HISTORY_LOCK))?;
        lock.lock_exclusive()?;
        let content = serde_json::to_vec_pretty(history)?;
        let result = write_atomic(&self.history_file(), &content);
        FileExt::unlock(&lock)?;
        result
    }
}
