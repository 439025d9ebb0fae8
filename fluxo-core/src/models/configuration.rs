//! Configuration data structures

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logging level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "trace")]
    Trace,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Path of the JSON solicitation store (default: ~/.fluxo/solicitations.json)
    pub store_path: Option<PathBuf>,
    /// Actor identifier used when --actor is not given
    pub default_actor: Option<String>,
    /// Capabilities granted to the default actor
    pub default_capabilities: Vec<String>,
    /// Logging verbosity level
    pub log_level: LogLevel,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            store_path: None,
            default_actor: None,
            default_capabilities: Vec::new(),
            log_level: LogLevel::Info,
        }
    }
}

impl Configuration {
    /// Load configuration from file; a missing file yields defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .context("Failed to read configuration file")?;
            let config: Configuration =
                toml::from_str(&content).context("Failed to parse configuration file")?;
            Ok(config)
        } else {
            Ok(Configuration::default())
        }
    }

    /// Save configuration to file, creating parent directories as needed
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create configuration directory")?;
        }
        std::fs::write(path, content).context("Failed to write configuration file")?;
        Ok(())
    }

    /// Default configuration file path under the XDG config directory
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("fluxo").join("config.toml"))
    }

    /// Load from the default path
    pub fn load() -> Result<Self> {
        Self::load_from_file(&Self::default_config_path()?)
    }
}
