//! Configuration file support for the depot tracker.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/depot/config.toml`.

use crate::model::{self, DEFAULT_CLEARANCE_FRACTION};
use crate::{Error, ModelConstants, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub model: ModelConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Operator-tunable model parameters
///
/// Only the clearance fraction is exposed; the other constants are fixed
/// defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_clearance_fraction")]
    pub clearance_fraction: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            clearance_fraction: default_clearance_fraction(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("depot")
}

fn default_clearance_fraction() -> f64 {
    DEFAULT_CLEARANCE_FRACTION
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load configuration from `path`, or defaults if there is no file
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load_from(config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    ///
    /// An out-of-range clearance fraction is rejected here rather than at
    /// first use.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.model_constants()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("depot").join("config.toml")
    }

    /// Model constants with the configured clearance fraction
    pub fn model_constants(&self) -> Result<ModelConstants> {
        ModelConstants::with_clearance_fraction(self.model.clearance_fraction)
    }

    /// Change the clearance fraction; the old value is kept on error
    pub fn set_clearance_fraction(&mut self, value: f64) -> Result<()> {
        model::validate_clearance_fraction(value)?;
        self.model.clearance_fraction = value;
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
