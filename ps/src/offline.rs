//! Stand-in for storage that could not be opened

use std::path::PathBuf;

use crate::error::StoreError;
use crate::history::{HistoryMap, HistoryStore};
use crate::record::OverlayRecord;
use crate::store::RecordStore;

/// Record and history store whose every call fails with `Unavailable`.
///
/// Hosts use it when opening the real store failed, so reads degrade to an
/// empty overlay and writes report the outage instead of vanishing.
#[derive(Debug, Clone)]
pub struct OfflineStore {
    path: PathBuf,
    reason: String,
}

impl OfflineStore {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    fn unavailable(&self) -> StoreError {
        StoreError::Unavailable {
            path: self.path.clone(),
            source: std::io::Error::other(self.reason.clone()),
        }
    }
}

impl RecordStore for OfflineStore {
    fn load_all(&self) -> Result<Vec<OverlayRecord>, StoreError> {
        Err(self.unavailable())
    }

    fn upsert(&mut self, _record: OverlayRecord) -> Result<(), StoreError> {
        Err(self.unavailable())
    }

    fn remove(&mut self, _id: &str) -> Result<(), StoreError> {
        Err(self.unavailable())
    }

    fn retain(&mut self, _keep: &dyn Fn(&OverlayRecord) -> bool) -> Result<(), StoreError> {
        Err(self.unavailable())
    }
}

impl HistoryStore for OfflineStore {
    fn load(&self) -> Result<HistoryMap, StoreError> {
        Err(self.unavailable())
    }

    fn save(&mut self, _history: &HistoryMap) -> Result<(), StoreError> {
        Err(self.unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_call_is_unavailable() {
        let mut store = OfflineStore::new("/blocked/store", "Not a directory");

        let err = RecordStore::load_all(&store).unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("/blocked/store"));
        assert!(err.to_string().contains("Not a directory"));

        assert!(store.upsert(OverlayRecord::deletion("Noir")).unwrap_err().is_unavailable());
        assert!(store.clear().unwrap_err().is_unavailable());
        assert!(HistoryStore::load(&store).unwrap_err().is_unavailable());
        assert!(store.save(&HistoryMap::new()).unwrap_err().is_unavailable());
    }

    #[test]
    fn test_boxed_stores_forward() {
        let mut records: Box<dyn RecordStore> = Box::new(OfflineStore::new("/x", "down"));
        assert!(records.remove("deleted_Noir").unwrap_err().is_unavailable());

        let history: Box<dyn HistoryStore> = Box::new(crate::MemoryHistoryStore::new());
        assert!(history.load().unwrap().is_empty());
    }
}
