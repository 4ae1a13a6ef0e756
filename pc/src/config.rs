//! PresetCam configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::resolve::{AspectRatio, ResolveSettings};

/// Main PresetCam configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Base catalog configuration
    pub catalog: CatalogConfig,

    /// Prompt resolution settings
    pub prompt: PromptConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from `config_path`, else the first readable
    /// candidate file, else defaults. Only an explicit path is required to load.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths().iter().filter(|path| path.exists()) {
            match Self::load_from_file(candidate) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!(path = %candidate.display(), error = %e, "Skipping unreadable config"),
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up. Errors are ignored.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::candidate_paths(),
        };
        candidates
            .iter()
            .find(|path| path.exists())
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    /// `./.presetcam.yml`, then `<config dir>/presetcam/presetcam.yml`
    fn candidate_paths() -> Vec<PathBuf> {
        [Some(PathBuf::from(".presetcam.yml")), Self::user_config_path()]
            .into_iter()
            .flatten()
            .collect()
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("presetcam").join("presetcam.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding overlay records and selection history
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = dirs::data_local_dir()
            .map(|d| d.join("presetcam"))
            .unwrap_or_else(|| PathBuf::from(".presetcam"));
        Self { dir }
    }
}

/// Base catalog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Factory catalog JSON; imported presets are used when unset
    #[serde(rename = "factory-path")]
    pub factory_path: Option<PathBuf>,
}

/// Prompt resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Append the master prompt to every preset
    #[serde(rename = "master-prompt-enabled")]
    pub master_prompt_enabled: bool,

    /// Master prompt text
    #[serde(rename = "master-prompt-text")]
    pub master_prompt_text: String,

    /// Aspect ratio instruction (none, 1:1, 16:9)
    #[serde(rename = "aspect-ratio")]
    pub aspect_ratio: AspectRatio,
}

impl PromptConfig {
    pub fn settings(&self) -> ResolveSettings {
        ResolveSettings {
            master_prompt_enabled: self.master_prompt_enabled,
            master_prompt_text: self.master_prompt_text.clone(),
            aspect_ratio: self.aspect_ratio,
        }
    }
}
