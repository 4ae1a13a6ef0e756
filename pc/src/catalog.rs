//! Catalog files and preset import
//!
//! A catalog is a JSON array of presets. Imported lists replace the factory
//! catalog as the repository's base, so the merge rules here operate on plain
//! preset lists and never touch overlay records.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::Preset;

/// Errors reading or writing catalog files
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File could not be read or written
    #[error("catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content is not valid JSON
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level value is not an array
    #[error("catalog must be a JSON array of presets")]
    NotAnArray,
}

impl CatalogError {
    /// True for errors caused by the content rather than the file system
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Json(_) | Self::NotAnArray)
    }
}

/// Parse catalog JSON.
///
/// Entries without a non-empty `name`, a non-empty `message` or an array
/// `category` are skipped. The result is sorted case-insensitively by name.
pub fn parse_catalog(json: &str) -> Result<Vec<Preset>, CatalogError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = value else {
        return Err(CatalogError::NotAnArray);
    };

    let total = entries.len();
    let mut presets = Vec::with_capacity(total);
    for (i, entry) in entries.into_iter().enumerate() {
        if !is_importable(&entry) {
            warn!(index = i, "parse_catalog: skipping entry without name, message or category");
            continue;
        }
        match serde_json::from_value::<Preset>(entry) {
            Ok(mut preset) => {
                preset.dedupe_categories();
                presets.push(preset);
            }
            Err(e) => warn!(index = i, error = %e, "parse_catalog: skipping undecodable entry"),
        }
    }

    presets.sort_by_cached_key(|p| p.name.to_lowercase());
    debug!(total, kept = presets.len(), "parse_catalog: done");
    Ok(presets)
}

fn is_importable(entry: &Value) -> bool {
    let non_empty = |key: &str| entry.get(key).and_then(Value::as_str).is_some_and(|s| !s.trim().is_empty());
    non_empty("name") && non_empty("message") && entry.get("category").is_some_and(Value::is_array)
}

/// Read and parse a catalog file
pub fn load_catalog_file(path: &Path) -> Result<Vec<Preset>, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let presets = parse_catalog(&content)?;
    info!(path = %path.display(), count = presets.len(), "Loaded catalog");
    Ok(presets)
}

/// Write presets as a pretty-printed catalog file
pub fn save_catalog_file(path: &Path, presets: &[Preset]) -> Result<(), CatalogError> {
    let io_err = |source: std::io::Error| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(presets)?;
    fs::write(path, content).map_err(io_err)?;
    debug!(path = %path.display(), count = presets.len(), "save_catalog_file: written");
    Ok(())
}

/// Delete an imported catalog file. Returns false if there was none.
pub fn clear_imported(path: &Path) -> Result<bool, CatalogError> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "Cleared imported catalog");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Keep presets whose name contains `query`, ignoring case. A blank query keeps all.
pub fn filter_by_name(presets: Vec<Preset>, query: &str) -> Vec<Preset> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return presets;
    }
    presets
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .collect()
}

/// How an incoming preset relates to the current list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    /// No preset with this name exists
    New,
    /// Same name, different message
    Updated,
    /// Same name and message
    Unchanged,
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Updated => write!(f, "UPDATED"),
            Self::Unchanged => write!(f, "UNCHANGED"),
        }
    }
}

pub fn import_status(existing: &[Preset], candidate: &Preset) -> ImportStatus {
    match existing.iter().find(|p| p.name == candidate.name) {
        None => ImportStatus::New,
        Some(current) if current.message != candidate.message => ImportStatus::Updated,
        Some(_) => ImportStatus::Unchanged,
    }
}

/// Counts reported after an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub updated: usize,
    pub added: usize,
    pub total: usize,
}

impl ImportSummary {
    /// Human-readable summary line
    pub fn message(&self) -> String {
        match (self.updated, self.added) {
            (0, 0) => format!("No presets imported. Total: {}", self.total),
            (u, 0) => format!("Updated {} preset(s). Total: {}", u, self.total),
            (0, a) => format!("Imported {} new preset(s). Total: {}", a, self.total),
            (u, a) => format!("Updated {}, imported {} new. Total: {}", u, a, self.total),
        }
    }
}

/// Merge selected presets into an existing list.
///
/// Same-named presets are replaced in place, the rest are appended.
pub fn merge_import(existing: &[Preset], selected: &[Preset]) -> (Vec<Preset>, ImportSummary) {
    let mut merged = existing.to_vec();
    let mut summary = ImportSummary::default();

    for preset in selected {
        match merged.iter_mut().find(|p| p.name == preset.name) {
            Some(slot) => {
                *slot = preset.clone();
                summary.updated += 1;
            }
            None => {
                merged.push(preset.clone());
                summary.added += 1;
            }
        }
    }

    summary.total = merged.len();
    info!(updated = summary.updated, added = summary.added, total = summary.total, "Merged import");
    (merged, summary)
}

/// Remove a preset from an imported list by name
pub fn remove_imported(list: &mut Vec<Preset>, name: &str) -> bool {
    let before = list.len();
    list.retain(|p| p.name != name);
    let removed = list.len() != before;
    debug!(name, removed, "remove_imported: called");
    removed
}
