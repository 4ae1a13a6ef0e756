//! PresetCam - preset catalog and prompt resolution for an AI camera
//!
//! A preset is a named instruction template. The factory (or imported)
//! catalog is read-only; user edits live as overlay records in a
//! [`presetstore`] store and are merged over the catalog on every load.
//! At capture time a preset is resolved into the exact prompt sent to the
//! image-transform service, with any seeded choices collapsed.
//!
//! # Modules
//!
//! - [`domain`]: `Preset`, `PresetOption`, `PresetPatch`
//! - [`overlay`]: overlay merge and the `PresetRepository`
//! - [`resolve`]: template parsing and prompt resolution
//! - [`history`]: bounded per-preset selection history
//! - [`catalog`]: catalog files and import merging
//! - [`config`], [`cli`]: the `pc` binary's configuration and arguments
//!
//! # Example
//!
//! ```ignore
//! use presetcam::history::NoHistory;
//! use presetcam::overlay::PresetRepository;
//! use presetcam::resolve::{ResolveSettings, resolve_prompt};
//! use presetstore::JsonlRecordStore;
//!
//! let mut repo = PresetRepository::new(JsonlRecordStore::open(".presetcam")?);
//! repo.load(presetcam::catalog::load_catalog_file("presets.json".as_ref())?);
//! let preset = repo.get("Animals").unwrap();
//! let prompt = resolve_prompt(&preset, &ResolveSettings::default(), 1007, None, &mut NoHistory);
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod history;
pub mod overlay;
pub mod resolve;

pub use catalog::{CatalogError, ImportStatus, ImportSummary};
pub use domain::{Preset, PresetOption, PresetPatch};
pub use history::{NoHistory, SelectionHistory, SelectionLog};
pub use overlay::{LoadReport, PresetRepository};
pub use resolve::{AspectRatio, PromptResolver, Resolution, ResolveSettings, resolve_prompt};
