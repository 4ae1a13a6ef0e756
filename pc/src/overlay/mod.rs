//! Overlay store: base catalog + user modification/deletion/new records

mod merge;
mod repository;

pub use merge::merge_presets;
pub use repository::{LoadReport, PresetRepository};
