#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Interval-based file and directory watching
//!
//! This crate watches a file or a directory tree by polling:
//! - One synchronous enumeration when a session starts
//! - A full metadata re-check of every tracked path on each tick
//! - Discovery of new entries inside directories whose metadata changed
//! - Changes handed to the consumer one non-empty batch at a time
//! - Cooperative shutdown through a cancellation token
//!
//! No OS change-notification facility is used and symbolic links are never
//! followed.
//!
//! # Example
//!
//! ```no_run
//! use pollwatch_watcher::{start, CancellationToken};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cancel = CancellationToken::new();
//! let interval = Some(Duration::from_millis(500));
//! let mut batches = start(cancel.clone(), "/path/to/project", true, interval).await?;
//!
//! while let Some(batch) = batches.recv().await {
//!     for event in &batch {
//!         println!("{} added={}", event.path().display(), event.was_added());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// Private implementation modules
mod config;
mod events;
mod scanner;
mod walk;
mod watcher;

// Public exports
pub use config::{WatcherConfig, WatcherConfigBuilder};
pub use events::{Batch, ChangeEvent, ChangeKind, FileMetadata, ScanError};
pub use scanner::Scanner;
pub use watcher::{start, BatchStream, PollWatcher, DEFAULT_INTERVAL};

/// Cancellation token type accepted by [`start`] and [`PollWatcher::watch`]
pub use tokio_util::sync::CancellationToken;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::events::{Batch, ChangeEvent};
    pub use crate::watcher::{start, BatchStream, PollWatcher};
    pub use tokio_util::sync::CancellationToken;
}
