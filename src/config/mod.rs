//! Configuration module
//!
//! Handles loading and managing configuration.

pub mod env;
mod file;

pub use env::EnvConfig;
pub use file::ConfigFile;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::DEFAULT_TIMES;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default command to invoke
    pub command: Option<String>,

    /// Default arguments for the command
    #[serde(default)]
    pub args: Vec<String>,

    /// Default number of concurrent invocations
    pub times: u32,

    /// Default number of sequential rounds
    pub rounds: u32,

    /// Wall-clock timeout in seconds for a whole run, 0 disables it
    pub timeout_secs: u64,

    /// Default output format
    pub format: String,

    /// Persist run summaries by default
    pub save_results: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            times: DEFAULT_TIMES,
            rounds: 1,
            timeout_secs: 0,
            format: "table".to_string(),
            save_results: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if path
            .as_ref()
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if path
            .as_ref()
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Timeout as an Option, treating 0 as disabled
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}
