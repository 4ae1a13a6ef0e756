//! Selection history tracker
//!
//! Bounded, most-recent-first log of the option texts chosen for each preset.
//! The history is advisory: nothing reads it back to influence selection.

use presetstore::{HistoryMap, HistoryStore};
use tracing::{debug, warn};

/// Maximum entries kept per preset
pub const MAX_HISTORY: usize = 5;

/// Sink for selections made during prompt resolution
pub trait SelectionLog {
    /// Record that `text` was chosen for `preset_name`. Must not fail.
    fn add_selection(&mut self, preset_name: &str, text: &str);
}

/// Selection log that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl SelectionLog for NoHistory {
    fn add_selection(&mut self, _preset_name: &str, _text: &str) {}
}

/// Cached selection history written through to a [`HistoryStore`]
pub struct SelectionHistory<S: HistoryStore> {
    store: S,
    cache: HistoryMap,
}

impl<S: HistoryStore> SelectionHistory<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: HistoryMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reload the cache from the store if it is empty
    fn ensure_loaded(&mut self) {
        if !self.cache.is_empty() {
            return;
        }
        match self.store.load() {
            Ok(history) => {
                debug!(presets = history.len(), "Loaded selection history");
                self.cache = history;
            }
            Err(e) => warn!(error = %e, "Selection history unavailable"),
        }
    }

    /// Up to [`MAX_HISTORY`] selections for a preset, most recent first
    pub fn get_history(&mut self, preset_name: &str) -> Vec<String> {
        self.ensure_loaded();
        self.cache
            .get(preset_name)
            .map(|entries| entries.iter().take(MAX_HISTORY).cloned().collect())
            .unwrap_or_default()
    }
}

impl<S: HistoryStore> SelectionLog for SelectionHistory<S> {
    fn add_selection(&mut self, preset_name: &str, text: &str) {
        self.ensure_loaded();
        let entries = self.cache.entry(preset_name.to_string()).or_default();
        entries.insert(0, text.to_string());
        entries.truncate(MAX_HISTORY);
        debug!(preset_name, text, "Recorded selection");

        if let Err(e) = self.store.save(&self.cache) {
            warn!(preset_name, error = %e, "Failed to persist selection history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presetstore::{MemoryHistoryStore, StoreError};

    #[test]
    fn test_history_bound_most_recent_first() {
        let mut history = SelectionHistory::new(MemoryHistoryStore::new());
        for text in ["one", "two", "three", "four", "five", "six"] {
            history.add_selection("Pets", text);
        }
        assert_eq!(history.get_history("Pets"), vec!["six", "five", "four", "three", "two"]);
    }

    #[test]
    fn test_history_is_per_preset() {
        let mut history = SelectionHistory::new(MemoryHistoryStore::new());
        history.add_selection("Pets", "Cats");
        history.add_selection("Hats", "Fedora");
        assert_eq!(history.get_history("Pets"), vec!["Cats"]);
        assert_eq!(history.get_history("Hats"), vec!["Fedora"]);
        assert!(history.get_history("Other").is_empty());
    }

    #[test]
    fn test_lazy_reload_from_store() {
        let mut stored = HistoryMap::new();
        stored.insert("Pets".to_string(), vec!["Dogs".to_string()]);
        let mut history = SelectionHistory::new(MemoryHistoryStore::with_history(stored));

        assert_eq!(history.get_history("Pets"), vec!["Dogs"]);

        history.add_selection("Pets", "Cats");
        assert_eq!(history.store().load().unwrap()["Pets"], vec!["Cats", "Dogs"]);
    }

    #[test]
    fn test_add_keeps_other_stored_presets() {
        let mut stored = HistoryMap::new();
        stored.insert("Hats".to_string(), vec!["Fedora".to_string()]);
        let mut history = SelectionHistory::new(MemoryHistoryStore::with_history(stored));

        history.add_selection("Pets", "Cats");
        let saved = history.store().load().unwrap();
        assert_eq!(saved["Hats"], vec!["Fedora"]);
        assert_eq!(saved["Pets"], vec!["Cats"]);
    }

    struct BrokenStore;

    impl HistoryStore for BrokenStore {
        fn load(&self) -> Result<HistoryMap, StoreError> {
            Err(StoreError::Corrupt {
                location: "memory".to_string(),
                reason: "broken".to_string(),
            })
        }
        fn save(&mut self, _history: &HistoryMap) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_store_failures_are_absorbed() {
        let mut history = SelectionHistory::new(BrokenStore);
        history.add_selection("Pets", "Cats");
        assert_eq!(history.get_history("Pets"), vec!["Cats"]);
    }
}
