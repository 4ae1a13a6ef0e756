//! Overlay record stores

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::record::OverlayRecord;

const RECORDS_FILE: &str = "overlay_records.jsonl";
const RECORDS_LOCK: &str = "overlay_records.lock";

/// Bulk-readable store of overlay records with idempotent upserts by id
pub trait RecordStore {
    /// Read every record. Unreadable entries are skipped, not returned as errors.
    fn load_all(&self) -> Result<Vec<OverlayRecord>, StoreError>;

    /// Insert or replace the record with the same id
    fn upsert(&mut self, record: OverlayRecord) -> Result<(), StoreError>;

    /// Remove the record with the given id (no-op if absent)
    fn remove(&mut self, id: &str) -> Result<(), StoreError>;

    /// Keep only the records matching the predicate
    fn retain(&mut self, keep: &dyn Fn(&OverlayRecord) -> bool) -> Result<(), StoreError>;

    /// Remove every record
    fn clear(&mut self) -> Result<(), StoreError> {
        self.retain(&|_| false)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn load_all(&self) -> Result<Vec<OverlayRecord>, StoreError> {
        (**self).load_all()
    }

    fn upsert(&mut self, record: OverlayRecord) -> Result<(), StoreError> {
        (**self).upsert(record)
    }

    fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        (**self).remove(id)
    }

    fn retain(&mut self, keep: &dyn Fn(&OverlayRecord) -> bool) -> Result<(), StoreError> {
        (**self).retain(keep)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// In-memory record store, used by tests and by hosts without durable storage
#[derive(Debug, Default, Clone)]
pub struct MemoryRecordStore {
    records: Vec<OverlayRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records
    pub fn with_records(records: Vec<OverlayRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load_all(&self) -> Result<Vec<OverlayRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn upsert(&mut self, record: OverlayRecord) -> Result<(), StoreError> {
        upsert_into(&mut self.records, record);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        self.records.retain(|r| r.id != id);
        Ok(())
    }

    fn retain(&mut self, keep: &dyn Fn(&OverlayRecord) -> bool) -> Result<(), StoreError> {
        self.records.retain(|r| keep(r));
        Ok(())
    }
}

/// Record store backed by a JSONL file, guarded by an advisory file lock
pub struct JsonlRecordStore {
    /// Directory holding the records file
    base_path: PathBuf,
}

impl JsonlRecordStore {
    /// Open or create a record store in the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|source| StoreError::Unavailable {
            path: base_path.clone(),
            source,
        })?;
        debug!(?base_path, "Opened overlay record store");
        Ok(Self { base_path })
    }

    /// Path of the JSONL records file
    pub fn records_file(&self) -> PathBuf {
        self.base_path.join(RECORDS_FILE)
    }

    fn rewrite(&self, edit: impl FnOnce(&mut Vec<OverlayRecord>)) -> Result<(), StoreError> {
        let lock = open_lock(&self.base_path.join(RECORDS_LOCK))?;
        lock.lock_exclusive()?;

        let path = self.records_file();
        let mut records = read_records(&path)?;
        edit(&mut records);

        let mut content = String::new();
        for record in &records {
            content.push_str(&serde_json::to_string(record)?);
            content.push('\n');
        }
        let result = write_atomic(&path, content.as_bytes());

        FileExt::unlock(&lock)?;
        result
    }
}

impl RecordStore for JsonlRecordStore {
    fn load_all(&self) -> Result<Vec<OverlayRecord>, StoreError> {
        let lock = open_lock(&self.base_path.join(RECORDS_LOCK))?;
        lock.lock_shared()?;
        let records = read_records(&self.records_file());
        FileExt::unlock(&lock)?;
        records
    }

    fn upsert(&mut self, record: OverlayRecord) -> Result<(), StoreError> {
        info!(id = %record.id, kind = %record.kind, "Writing overlay record");
        self.rewrite(|records| upsert_into(records, record))
    }

    fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        debug!(id, "Removing overlay record");
        self.rewrite(|records| records.retain(|r| r.id != id))
    }

    fn retain(&mut self, keep: &dyn Fn(&OverlayRecord) -> bool) -> Result<(), StoreError> {
        self.rewrite(|records| records.retain(|r| keep(r)))
    }
}

fn upsert_into(records: &mut Vec<OverlayRecord>, record: OverlayRecord) {
    match records.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

/// Read all records from a JSONL file, skipping corrupt lines.
/// A later line with the same id replaces the earlier one.
fn read_records(path: &Path) -> Result<Vec<OverlayRecord>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Unavailable {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let content = String::from_utf8_lossy(&bytes);

    let mut records: Vec<OverlayRecord> = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<OverlayRecord>(line) {
            Ok(record) => {
                records.retain(|r| r.id != record.id);
                records.push(record);
            }
            Err(e) => {
                let err = StoreError::Corrupt {
                    location: format!("{}:{}", path.display(), idx + 1),
                    reason: e.to_string(),
                };
                warn!(error = %err, "Skipping overlay record");
            }
        }
    }
    Ok(records)
}

pub(crate) fn open_lock(path: &Path) -> Result<fs::File, StoreError> {
    fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|source| StoreError::Unavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Write through a sibling temp file so readers never see a half-written file
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(content)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_upsert_and_load() {
        let temp = TempDir::new().unwrap();
        let mut store = JsonlRecordStore::open(temp.path()).unwrap();

        store.upsert(OverlayRecord::deletion("Noir")).unwrap();
        store
            .upsert(OverlayRecord::modification("Sepia", json!({"message": "warm"})))
            .unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, RecordKind::Deletion);
        assert_eq!(records[1].data["message"], "warm");
    }

    #[test]
    fn test_upsert_is_idempotent_by_id() {
        let temp = TempDir::new().unwrap();
        let mut store = JsonlRecordStore::open(temp.path()).unwrap();

        store
            .upsert(OverlayRecord::modification("Sepia", json!({"message": "one"})))
            .unwrap();
        store
            .upsert(OverlayRecord::modification("Sepia", json!({"message": "two"})))
            .unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data["message"], "two");
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        let store = JsonlRecordStore::open(temp.path()).unwrap();

        let good = serde_json::to_string(&OverlayRecord::deletion("Noir")).unwrap();
        let content = format!("{{not json\n{}\n{{\"id\":\"x\",\"type\":\"bogus\",\"name\":\"x\",\"timestamp\":0}}\n", good);
        fs::write(store.records_file(), content).unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Noir");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonlRecordStore::open(temp.path()).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_remove_and_retain() {
        let temp = TempDir::new().unwrap();
        let mut store = JsonlRecordStore::open(temp.path()).unwrap();

        store.upsert(OverlayRecord::deletion("Noir")).unwrap();
        store.upsert(OverlayRecord::modification("Noir", json!({}))).unwrap();
        store.upsert(OverlayRecord::new_preset("Mine", json!({}))).unwrap();

        store.remove("deleted_Noir").unwrap();
        assert_eq!(store.load_all().unwrap().len(), 2);

        store.retain(&|r| r.kind == RecordKind::New).unwrap();
        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "new_Mine");

        store.clear().unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_open_fails_when_path_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let err = JsonlRecordStore::open(blocker.join("store")).err().unwrap();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryRecordStore::new();
        store.upsert(OverlayRecord::deletion("Noir")).unwrap();
        store.upsert(OverlayRecord::deletion("Noir")).unwrap();
        assert_eq!(store.len(), 1);
        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
