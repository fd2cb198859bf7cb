//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;
use tracing::debug;

use super::defaults::*;
use super::Config;

/// Prefix for environment variable overrides
pub(crate) const ENV_PREFIX: &str = "POLLWATCH";

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// A missing file is not an error; defaults and environment still apply.
    /// Environment variables are prefixed with `POLLWATCH_` and use double
    /// underscores for nested values, e.g. `POLLWATCH_WATCHER__INTERVAL_MS=500`.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::load(Some(path))
    }

    /// Loads configuration from defaults and environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    fn load(path: Option<&Path>) -> Result<Self> {
        let builder = ConfigLib::builder();

        // config crate doesn't apply serde defaults for missing sections
        let builder =
            set_config_default(builder, "watcher.interval_ms", default_interval_ms() as i64)?;
        let mut builder = set_config_default(builder, "watcher.recursive", default_recursive())?;

        if let Some(path) = path {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                builder = builder.add_source(File::from(path));
            } else {
                debug!("Config file {} not found, using defaults", path.display());
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, toml_string)
            .map_err(|e| Error::config(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}
