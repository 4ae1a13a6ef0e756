//! Domain types for presetcam

mod preset;

pub use preset::{Preset, PresetOption, PresetPatch};
