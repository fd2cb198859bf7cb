//! Change event types and metadata snapshots
//!
//! This module defines the immutable values that cross from the scanning
//! worker to the consumer: per-path metadata snapshots, change events and
//! the non-empty batches they are delivered in.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Metadata snapshot of a single tracked path
///
/// Taken from the path itself; symbolic links are described, never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// Whether the path is a directory
    pub is_dir: bool,
    /// Whether the path is a symbolic link
    pub is_symlink: bool,
    /// Last modified time (`UNIX_EPOCH` if the platform cannot report it)
    pub modified: SystemTime,
    /// Size in bytes
    pub size: u64,
    /// Whether the path is read-only
    pub readonly: bool,
}

impl FileMetadata {
    /// Create a new snapshot for a regular file
    pub fn new(size: u64, modified: SystemTime) -> Self {
        Self {
            is_dir: false,
            is_symlink: false,
            modified,
            size,
            readonly: false,
        }
    }

    /// Create a new snapshot for a directory
    pub fn directory(size: u64, modified: SystemTime) -> Self {
        Self {
            is_dir: true,
            ..Self::new(size, modified)
        }
    }

    /// Whether `self` should be reported as a change relative to `previous`
    ///
    /// Only a modification time that moved forward or a different size
    /// counts. Two writes inside one timestamp tick that leave the size
    /// unchanged are indistinguishable.
    pub fn differs_from(&self, previous: &FileMetadata) -> bool {
        self.modified > previous.modified || self.size != previous.size
    }
}

impl From<&Metadata> for FileMetadata {
    fn from(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        Self {
            is_dir: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            size: metadata.len(),
            readonly: metadata.permissions().readonly(),
        }
    }
}

/// Failure observed while scanning a tracked path
#[derive(Debug, Error)]
pub enum ScanError {
    /// Re-reading the metadata of a tracked path failed
    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Walking a changed directory for new entries failed
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl ScanError {
    /// Path the failing operation was run against
    pub fn path(&self) -> &Path {
        match self {
            Self::Stat { path, .. } | Self::Walk { path, .. } => path,
        }
    }

    /// Whether the failure means the path no longer exists
    pub fn is_not_found(&self) -> bool {
        let kind = match self {
            Self::Stat { source, .. } => Some(source.kind()),
            Self::Walk { source, .. } => source.io_error().map(io::Error::kind),
        };
        kind == Some(io::ErrorKind::NotFound)
    }
}

/// What happened to a path between two scans
#[derive(Debug)]
pub enum ChangeKind {
    /// Path was found by the initial enumeration or a discovery walk
    Added { metadata: FileMetadata },
    /// Path still exists but its modification time or size changed
    Modified {
        previous: FileMetadata,
        current: FileMetadata,
        /// Set when walking this directory for new entries failed
        discovery_error: Option<ScanError>,
    },
    /// Path no longer exists and is no longer tracked
    Removed {
        previous: FileMetadata,
        error: ScanError,
    },
    /// Path could not be read this scan but stays tracked
    Errored {
        previous: FileMetadata,
        error: ScanError,
    },
}

/// A single change to a tracked path
#[derive(Debug)]
pub struct ChangeEvent {
    /// Absolute path affected
    pub path: PathBuf,
    /// Kind of change with its metadata
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub(crate) fn added(path: PathBuf, metadata: FileMetadata) -> Self {
        Self {
            path,
            kind: ChangeKind::Added { metadata },
        }
    }

    pub(crate) fn modified(
        path: PathBuf,
        previous: FileMetadata,
        current: FileMetadata,
        discovery_error: Option<ScanError>,
    ) -> Self {
        Self {
            path,
            kind: ChangeKind::Modified {
                previous,
                current,
                discovery_error,
            },
        }
    }

    pub(crate) fn removed(path: PathBuf, previous: FileMetadata, error: ScanError) -> Self {
        Self {
            path,
            kind: ChangeKind::Removed { previous, error },
        }
    }

    pub(crate) fn errored(path: PathBuf, previous: FileMetadata, error: ScanError) -> Self {
        Self {
            path,
            kind: ChangeKind::Errored { previous, error },
        }
    }

    /// Get the path associated with this change
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metadata before this change
    ///
    /// For additions this is the metadata observed when the path was found.
    pub fn previous(&self) -> &FileMetadata {
        match &self.kind {
            ChangeKind::Added { metadata } => metadata,
            ChangeKind::Modified { previous, .. }
            | ChangeKind::Removed { previous, .. }
            | ChangeKind::Errored { previous, .. } => previous,
        }
    }

    /// Metadata after this change, only present for in-place modifications
    pub fn current(&self) -> Option<&FileMetadata> {
        match &self.kind {
            ChangeKind::Modified { current, .. } => Some(current),
            _ => None,
        }
    }

    /// Error attached to this change, if any
    pub fn error(&self) -> Option<&ScanError> {
        match &self.kind {
            ChangeKind::Added { .. } => None,
            ChangeKind::Modified {
                discovery_error, ..
            } => discovery_error.as_ref(),
            ChangeKind::Removed { error, .. } | ChangeKind::Errored { error, .. } => Some(error),
        }
    }

    pub fn was_added(&self) -> bool {
        matches!(self.kind, ChangeKind::Added { .. })
    }

    /// True for confirmed removals and for paths that failed to stat
    pub fn was_removed(&self) -> bool {
        matches!(
            self.kind,
            ChangeKind::Removed { .. } | ChangeKind::Errored { .. }
        )
    }

    /// Whether the path remains under observation after this event
    pub fn is_still_tracked(&self) -> bool {
        !matches!(self.kind, ChangeKind::Removed { .. })
    }
}

/// Non-empty set of changes produced by one scan pass
///
/// Event order carries no meaning.
#[derive(Debug)]
pub struct Batch {
    events: Vec<ChangeEvent>,
}

impl Batch {
    /// Create a batch, or `None` when there is nothing to report
    pub fn new(events: Vec<ChangeEvent>) -> Option<Self> {
        if events.is_empty() {
            None
        } else {
            Some(Self { events })
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEvent> {
        self.events.iter()
    }

    /// Find the event for a path
    pub fn get(&self, path: &Path) -> Option<&ChangeEvent> {
        self.events.iter().find(|event| event.path == path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn added(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter().filter(|event| event.was_added())
    }

    pub fn removed(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter().filter(|event| event.was_removed())
    }

    pub fn modified(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter().filter(|event| event.current().is_some())
    }
}

impl IntoIterator for Batch {
    type Item = ChangeEvent;
    type IntoIter = std::vec::IntoIter<ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a ChangeEvent;
    type IntoIter = std::slice::Iter<'a, ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stat_error(path: &str, kind: io::ErrorKind) -> ScanError {
        ScanError::Stat {
            path: PathBuf::from(path),
            source: io::Error::new(kind, "stat failed"),
        }
    }

    #[test]
    fn test_differs_from() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let t1 = t0 + Duration::from_millis(1);
        let base = FileMetadata::new(10, t0);

        assert!(!base.differs_from(&base));
        assert!(FileMetadata::new(10, t1).differs_from(&base));
        assert!(FileMetadata::new(11, t0).differs_from(&base));
        // mtime moving backwards with the same size is not a change
        assert!(!base.differs_from(&FileMetadata::new(10, t1)));
    }

    #[test]
    fn test_flat_view_of_added() {
        let meta = FileMetadata::directory(4096, SystemTime::now());
        let event = ChangeEvent::added(PathBuf::from("/w/dir"), meta);

        assert!(event.was_added());
        assert!(!event.was_removed());
        assert!(event.is_still_tracked());
        assert_eq!(event.previous(), &meta);
        assert!(event.current().is_none());
        assert!(event.error().is_none());
    }

    #[test]
    fn test_flat_view_of_modified() {
        let now = SystemTime::now();
        let previous = FileMetadata::new(0, now);
        let current = FileMetadata::new(3, now);
        let event = ChangeEvent::modified(PathBuf::from("/w/a"), previous, current, None);

        assert!(!event.was_added());
        assert!(!event.was_removed());
        assert_eq!(event.current().map(|m| m.size), Some(3));
        assert_eq!(event.previous().size, 0);
    }

    #[test]
    fn test_removed_and_errored_are_distinguishable() {
        let meta = FileMetadata::new(1, SystemTime::now());
        let removed = ChangeEvent::removed(
            PathBuf::from("/w/gone"),
            meta,
            stat_error("/w/gone", io::ErrorKind::NotFound),
        );
        let errored = ChangeEvent::errored(
            PathBuf::from("/w/locked"),
            meta,
            stat_error("/w/locked", io::ErrorKind::PermissionDenied),
        );

        assert!(removed.was_removed());
        assert!(errored.was_removed());
        assert!(!removed.is_still_tracked());
        assert!(errored.is_still_tracked());
        assert!(removed.error().is_some_and(ScanError::is_not_found));
        assert!(errored.error().is_some_and(|e| !e.is_not_found()));
    }

    #[test]
    fn test_scan_error_display() {
        let err = stat_error("/w/missing", io::ErrorKind::NotFound);
        assert_eq!(err.path(), Path::new("/w/missing"));
        assert!(err.to_string().contains("failed to stat /w/missing"));
    }

    #[test]
    fn test_batch_is_never_empty() {
        assert!(Batch::new(Vec::new()).is_none());

        let meta = FileMetadata::new(1, SystemTime::now());
        let batch = Batch::new(vec![
            ChangeEvent::added(PathBuf::from("/w/a"), meta),
            ChangeEvent::modified(PathBuf::from("/w/b"), meta, meta, None),
        ])
        .expect("non-empty batch");

        assert_eq!(batch.len(), 2);
        assert!(!batch.is_empty());
        assert!(batch.contains(Path::new("/w/a")));
        assert!(!batch.contains(Path::new("/w/c")));
        assert_eq!(batch.added().count(), 1);
        assert_eq!(batch.modified().count(), 1);
        assert_eq!(batch.removed().count(), 0);
        assert_eq!(batch.into_iter().count(), 2);
    }
}
