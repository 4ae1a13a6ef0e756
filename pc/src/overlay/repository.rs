//! PresetRepository - owns the base catalog and overlay records
//!
//! The repository keeps the decoded overlay records in memory, writes every
//! mutation through to a [`RecordStore`], and recomputes the resolved catalog
//! from base + records whenever it is asked for one.

use std::collections::{HashMap, HashSet};

use presetstore::{OverlayRecord, RecordKind, RecordStore, StoreError};
use tracing::{debug, info, warn};

use super::merge::merge_presets;
use crate::domain::{Preset, PresetPatch};

/// Outcome of loading overlay records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records decoded and applied
    pub applied: usize,
    /// Records skipped because their payload could not be decoded
    pub skipped: usize,
    /// False when the record store could not be read (base-only catalog)
    pub storage_available: bool,
}

/// A user-authored preset with its record timestamp
#[derive(Debug, Clone)]
struct NewEntry {
    preset: Preset,
    timestamp: i64,
}

/// Explicit replacement for module-level preset state
pub struct PresetRepository<S: RecordStore> {
    store: S,
    base: Vec<Preset>,
    modifications: HashMap<String, PresetPatch>,
    deletions: HashSet<String>,
    new_presets: Vec<NewEntry>,
}

impl<S: RecordStore> PresetRepository<S> {
    /// Create an empty repository over a record store
    pub fn new(store: S) -> Self {
        Self {
            store,
            base: Vec::new(),
            modifications: HashMap::new(),
            deletions: HashSet::new(),
            new_presets: Vec::new(),
        }
    }

    /// Access the underlying record store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Base catalog as loaded (internal presets)
    pub fn base(&self) -> &[Preset] {
        &self.base
    }

    /// Replace the base catalog and reload every overlay record from the store.
    ///
    /// An unreadable store leaves the repository with a base-only catalog.
    pub fn load(&mut self, base: Vec<Preset>) -> LoadReport {
        self.base = base
            .into_iter()
            .map(|mut p| {
                p.internal = true;
                p
            })
            .collect();
        self.modifications.clear();
        self.deletions.clear();
        self.new_presets.clear();

        let mut report = LoadReport::default();
        let mut records = match self.store.load_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Overlay records unavailable, using base catalog only");
                return report;
            }
        };
        report.storage_available = true;

        records.sort_by_key(|r| r.timestamp);
        for record in records {
            if self.decode(record) {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }

        self.new_presets.sort_by_key(|e| e.timestamp);
        info!(
            base = self.base.len(),
            applied = report.applied,
            skipped = report.skipped,
            "Loaded preset overlays"
        );
        report
    }

    /// Decode one stored record into in-memory state. Returns false if skipped.
    fn decode(&mut self, record: OverlayRecord) -> bool {
        match record.kind {
            RecordKind::Deletion => {
                self.deletions.insert(record.name);
                true
            }
            RecordKind::Modification => match serde_json::from_value::<PresetPatch>(record.data) {
                Ok(patch) => {
                    self.modifications.insert(record.name, patch);
                    true
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "Skipping corrupt modification record");
                    false
                }
            },
            RecordKind::New => match serde_json::from_value::<Preset>(record.data) {
                Ok(mut preset) if preset.name == record.name => {
                    preset.internal = false;
                    self.new_presets.retain(|e| e.preset.name != preset.name);
                    self.new_presets.push(NewEntry {
                        preset,
                        timestamp: record.timestamp,
                    });
                    true
                }
                Ok(preset) => {
                    warn!(id = %record.id, payload_name = %preset.name, "Skipping new-preset record with mismatched name");
                    false
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "Skipping corrupt new-preset record");
                    false
                }
            },
        }
    }

    /// The resolved catalog: base + overlays, recomputed on every call
    pub fn merged_catalog(&self) -> Vec<Preset> {
        let new: Vec<Preset> = self.new_presets.iter().map(|e| e.preset.clone()).collect();
        merge_presets(&self.base, &self.modifications, &self.deletions, &new)
    }

    /// Look up a preset in the resolved catalog
    pub fn get(&self, name: &str) -> Option<Preset> {
        self.merged_catalog().into_iter().find(|p| p.name == name)
    }

    /// Sorted, de-duplicated categories across the resolved catalog
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.merged_catalog().into_iter().flat_map(|p| p.category).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// True if a base preset carries a modification or deletion record
    pub fn is_overridden(&self, name: &str) -> bool {
        self.base_key_for(name)
            .is_some_and(|key| self.modifications.contains_key(&key) || self.deletions.contains(&key))
    }

    /// Base catalog key for a name as currently shown.
    ///
    /// A base preset renamed onto `name` wins (the last one in base order, as
    /// in the merge). A base preset renamed away no longer answers to its
    /// original name.
    fn base_key_for(&self, name: &str) -> Option<String> {
        let renamed_to = |key: &str| {
            self.modifications
                .get(key)
                .and_then(|patch| patch.name.as_deref())
                .filter(|new_name| *new_name != key)
        };

        if let Some(preset) = self.base.iter().rev().find(|p| renamed_to(&p.name) == Some(name)) {
            return Some(preset.name.clone());
        }
        self.base
            .iter()
            .find(|p| p.name == name && renamed_to(&p.name).is_none())
            .map(|p| p.name.clone())
    }

    fn persist(&mut self, record: OverlayRecord) -> Result<(), StoreError> {
        self.store.upsert(record).inspect_err(|e| {
            warn!(error = %e, "Failed to persist overlay record; change kept in memory");
        })
    }

    fn unpersist(&mut self, id: &str) -> Result<(), StoreError> {
        self.store.remove(id).inspect_err(|e| {
            warn!(id, error = %e, "Failed to remove overlay record; change kept in memory");
        })
    }

    /// Edit a preset. User-authored presets are rewritten in place; base presets
    /// get a modification record (merged with any earlier patch).
    ///
    /// Returns `Ok(false)` if no preset has that name. On a store error the
    /// in-memory change has already been applied.
    pub fn apply_modification(&mut self, name: &str, patch: PresetPatch) -> Result<bool, StoreError> {
        debug!(name, ?patch, "apply_modification: called");

        if let Some(pos) = self.new_presets.iter().position(|e| e.preset.name == name) {
            let mut preset = self.new_presets.remove(pos).preset;
            patch.apply(&mut preset);
            let renamed = preset.name != name;
            self.apply_new(preset)?;
            if renamed {
                self.unpersist(&OverlayRecord::record_id(RecordKind::New, name))?;
            }
            return Ok(true);
        }

        let Some(key) = self.base_key_for(name) else {
            debug!(name, "apply_modification: no such preset");
            return Ok(false);
        };

        let combined = match self.modifications.get(&key) {
            Some(existing) => existing.merged_with(&patch),
            None => patch,
        };
        let data = serde_json::to_value(&combined)?;
        self.modifications.insert(key.clone(), combined);
        info!(name = %key, "Modified preset");
        self.persist(OverlayRecord::modification(key, data))?;
        Ok(true)
    }

    /// Delete a preset. A user-authored preset loses its record; a base preset
    /// gets a deletion record. Returns `Ok(false)` if no preset has that name.
    pub fn apply_deletion(&mut self, name: &str) -> Result<bool, StoreError> {
        debug!(name, "apply_deletion: called");

        if let Some(pos) = self.new_presets.iter().position(|e| e.preset.name == name) {
            self.new_presets.remove(pos);
            info!(name, "Deleted user preset");
            self.unpersist(&OverlayRecord::record_id(RecordKind::New, name))?;
            return Ok(true);
        }

        let Some(key) = self.base_key_for(name) else {
            debug!(name, "apply_deletion: no such preset");
            return Ok(false);
        };
        self.deletions.insert(key.clone());
        info!(name = %key, "Deleted preset");
        self.persist(OverlayRecord::deletion(key))?;
        Ok(true)
    }

    /// Add a user-authored preset. A same-named entry is replaced and the new
    /// preset moves to the end of the catalog.
    pub fn apply_new(&mut self, mut preset: Preset) -> Result<(), StoreError> {
        debug!(name = %preset.name, "apply_new: called");
        preset.internal = false;
        preset.dedupe_categories();

        let data = serde_json::to_value(&preset)?;
        let record = OverlayRecord::new_preset(preset.name.clone(), data);
        self.new_presets.retain(|e| e.preset.name != preset.name);
        self.new_presets.push(NewEntry {
            preset,
            timestamp: record.timestamp,
        });
        info!(name = %record.name, "Saved user preset");
        self.persist(record)
    }

    /// Drop modification and deletion records for a base preset, returning it
    /// to its factory state. Returns `Ok(false)` if it had none.
    pub fn restore(&mut self, name: &str) -> Result<bool, StoreError> {
        let Some(key) = self.base_key_for(name) else {
            return Ok(false);
        };
        let had_patch = self.modifications.remove(&key).is_some();
        let had_deletion = self.deletions.remove(&key);
        if !had_patch && !had_deletion {
            return Ok(false);
        }

        info!(name = %key, "Restored factory preset");
        self.unpersist(&OverlayRecord::record_id(RecordKind::Modification, &key))?;
        self.unpersist(&OverlayRecord::record_id(RecordKind::Deletion, &key))?;
        Ok(true)
    }

    /// Drop every modification and deletion record; user presets are kept
    pub fn clear_factory_overrides(&mut self) -> Result<(), StoreError> {
        self.modifications.clear();
        self.deletions.clear();
        info!("Cleared factory preset overrides");
        self.store
            .retain(&|r| r.kind == RecordKind::New)
            .inspect_err(|e| warn!(error = %e, "Failed to clear overrides in store"))
    }

    /// Drop every overlay record, including user presets
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.modifications.clear();
        self.deletions.clear();
        self.new_presets.clear();
        info!("Cleared all preset overlays");
        self.store
            .clear()
            .inspect_err(|e| warn!(error = %e, "Failed to clear overlay store"))
    }
}
