//! Tracked-set ownership and the per-tick diff scan
//!
//! `Scanner` is fully synchronous. The watch worker moves it onto a blocking
//! thread for each tick, so only one scan ever runs per session.

use crate::events::{Batch, ChangeEvent, FileMetadata, ScanError};
use crate::walk::walk;
use pollwatch_core::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Paths under observation and their last observed metadata
#[derive(Debug)]
pub struct Scanner {
    /// Absolute watch root
    root: PathBuf,
    /// Whether subdirectories of the root are descended into
    recursive: bool,
    /// Tracked set keyed by absolute path
    tracked: HashMap<PathBuf, FileMetadata>,
}

impl Scanner {
    /// Resolve `path` and enumerate it
    ///
    /// Fails if the path cannot be made absolute or if any part of the
    /// initial walk fails. Nothing is tracked in that case.
    pub fn new(path: impl AsRef<Path>, recursive: bool) -> Result<Self> {
        let root = resolve(path.as_ref())?;

        let mut tracked = HashMap::new();
        walk(&root, &root, recursive, |path, metadata| {
            tracked.insert(path.to_path_buf(), metadata);
        })
        .map_err(|e| Error::with_context(format!("Failed to enumerate {}", root.display()), e))?;

        debug!(
            "Enumerated {} paths under {} (recursive: {})",
            tracked.len(),
            root.display(),
            recursive
        );

        Ok(Self {
            root,
            recursive,
            tracked,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of tracked paths
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.tracked.contains_key(path)
    }

    /// Last observed metadata for a tracked path
    pub fn metadata(&self, path: &Path) -> Option<&FileMetadata> {
        self.tracked.get(path)
    }

    /// One `Added` event for every tracked path
    pub fn initial_batch(&self) -> Option<Batch> {
        Batch::new(
            self.tracked
                .iter()
                .map(|(path, metadata)| ChangeEvent::added(path.clone(), *metadata))
                .collect(),
        )
    }

    /// Re-stat every tracked path and report what changed since the last scan
    ///
    /// Paths discovered during this scan are not re-checked until the next one.
    pub fn scan(&mut self) -> Vec<ChangeEvent> {
        let paths: Vec<PathBuf> = self.tracked.keys().cloned().collect();
        let mut events = Vec::new();

        for path in paths {
            let Some(previous) = self.tracked.get(&path).copied() else {
                continue;
            };

            match fs::symlink_metadata(&path) {
                Err(source) if source.kind() == io::ErrorKind::NotFound => {
                    trace!("Removed: {}", path.display());
                    self.tracked.remove(&path);
                    let error = ScanError::Stat {
                        path: path.clone(),
                        source,
                    };
                    events.push(ChangeEvent::removed(path, previous, error));
                }
                Err(source) => {
                    warn!("Failed to stat {}: {}", path.display(), source);
                    let error = ScanError::Stat {
                        path: path.clone(),
                        source,
                    };
                    events.push(ChangeEvent::errored(path, previous, error));
                }
                Ok(metadata) => {
                    let current = FileMetadata::from(&metadata);
                    if !current.differs_from(&previous) {
                        continue;
                    }

                    trace!("Modified: {}", path.display());
                    self.tracked.insert(path.clone(), current);

                    let mut discovered = Vec::new();
                    let discovery_error = if current.is_dir {
                        self.discover(&path, &mut discovered).err()
                    } else {
                        None
                    };

                    events.push(ChangeEvent::modified(
                        path,
                        previous,
                        current,
                        discovery_error,
                    ));
                    events.append(&mut discovered);
                }
            }
        }

        events
    }

    /// Walk a changed directory and start tracking anything not yet tracked
    fn discover(
        &mut self,
        dir: &Path,
        events: &mut Vec<ChangeEvent>,
    ) -> std::result::Result<(), ScanError> {
        let tracked = &mut self.tracked;

        walk(dir, &self.root, self.recursive, |path, metadata| {
            if !tracked.contains_key(path) {
                trace!("Added: {}", path.display());
                tracked.insert(path.to_path_buf(), metadata);
                events.push(ChangeEvent::added(path.to_path_buf(), metadata));
            }
        })
        .map_err(|source| {
            warn!("Failed to walk {}: {}", dir.display(), source);
            ScanError::Walk {
                path: dir.to_path_buf(),
                source,
            }
        })
    }
}

/// Make `path` absolute without touching the filesystem or following links
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .map_err(|e| Error::with_context(format!("Failed to resolve {}", path.display()), e))?;

    // Drop trailing separators and `.` components so keys compare cleanly
    Ok(absolute.components().collect())
}
