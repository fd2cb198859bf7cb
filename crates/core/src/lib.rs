//! Core types for the pollwatch polling file watcher
//!
//! This crate provides the foundational pieces shared by the watcher library
//! and the `pollwatch` binary:
//!
//! - **Error handling**: unified error type and `Result` alias
//! - **Configuration**: TOML and environment-driven settings
//!

pub mod config;
pub mod error;

// Re-export main types for convenience
pub use config::{Config, WatcherConfig};
pub use error::{Error, Result, ResultExt};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, ResultExt};
}
