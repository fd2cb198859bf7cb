//! Configuration module for pollwatch
//!
//! Settings can be loaded from TOML files and/or environment variables.
//! Command-line flags are applied on top by the binary.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use defaults::*;

pub use defaults::DEFAULT_INTERVAL_MS;

/// Main configuration structure for pollwatch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Watch session configuration
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Configuration for a single polling watch session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Milliseconds between scans
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Descend into subdirectories of the watch root
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            recursive: default_recursive(),
        }
    }
}

impl WatcherConfig {
    /// Get the polling interval
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Validates the watcher settings
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::config(
                "Invalid watcher.interval_ms: must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        self.watcher.validate()
    }
}
