//! CLI configuration file support
//!
//! Loads configuration from ~/.config/slackvault/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Slack credentials and endpoint
    #[serde(default)]
    pub slack: SlackSection,
    /// Default settings
    #[serde(default)]
    pub default: DefaultConfig,
}

/// Slack connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackSection {
    pub token: Option<String>,
    pub cookie: Option<String>,
    pub api_base_url: Option<String>,
}

/// Default configuration values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Working directory for responses and logs
    pub work_dir: Option<String>,
    /// Log level filter
    pub log_level: Option<String>,
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("slackvault").join("config.toml"))
    }
}
