//! Overlay record shapes
//!
//! Every record is keyed by a stable id derived from its kind and the preset
//! name, so writing the same kind of record twice for a preset is an upsert.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::now_ms;

/// Discriminator for stored overlay records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Patch over a base preset with the same name
    Modification,
    /// Removes a base preset from the resolved catalog
    Deletion,
    /// User-authored preset appended to the catalog
    New,
}

impl RecordKind {
    /// Prefix used when building record ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Modification => "modified",
            Self::Deletion => "deleted",
            Self::New => "new",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modification => write!(f, "modification"),
            Self::Deletion => write!(f, "deletion"),
            Self::New => write!(f, "new"),
        }
    }
}

/// A single stored overlay record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayRecord {
    /// Stable id: `{prefix}_{preset name}`
    pub id: String,

    /// Record kind
    #[serde(rename = "type")]
    pub kind: RecordKind,

    /// Name of the preset this record applies to
    pub name: String,

    /// Payload: a partial preset for modifications, a full preset for new
    /// records, absent for deletions
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,

    /// Last write time (Unix milliseconds)
    pub timestamp: i64,
}

impl OverlayRecord {
    /// Build the stable id for a record kind and preset name
    pub fn record_id(kind: RecordKind, name: &str) -> String {
        format!("{}_{}", kind.id_prefix(), name)
    }

    fn build(kind: RecordKind, name: impl Into<String>, data: Value) -> Self {
        let name = name.into();
        Self {
            id: Self::record_id(kind, &name),
            kind,
            name,
            data,
            timestamp: now_ms(),
        }
    }

    /// Create a modification record carrying a partial preset
    pub fn modification(name: impl Into<String>, patch: Value) -> Self {
        Self::build(RecordKind::Modification, name, patch)
    }

    /// Create a deletion record
    pub fn deletion(name: impl Into<String>) -> Self {
        Self::build(RecordKind::Deletion, name, Value::Null)
    }

    /// Create a record for a user-authored preset
    pub fn new_preset(name: impl Into<String>, preset: Value) -> Self {
        Self::build(RecordKind::New, name, preset)
    }
}
