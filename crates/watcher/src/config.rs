//! Builder for watch session configuration
//!
//! The configuration type itself lives in `pollwatch-core` so it can be
//! loaded from files and the environment; this module adds a fluent builder
//! for programmatic use.

pub use pollwatch_core::config::WatcherConfig;
use std::time::Duration;

/// Builder for WatcherConfig
#[derive(Debug, Default)]
pub struct WatcherConfigBuilder {
    config: WatcherConfig,
}

impl WatcherConfigBuilder {
    /// Start from the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set polling interval in milliseconds
    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.config.interval_ms = ms;
        self
    }

    /// Set polling interval, truncated to whole milliseconds
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set whether subdirectories are watched
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    /// Build the configuration
    pub fn build(self) -> WatcherConfig {
        self.config
    }
}
