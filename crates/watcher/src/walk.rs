//! Depth-first tree enumeration shared by setup and discovery scans

use crate::events::FileMetadata;
use std::path::Path;
use walkdir::WalkDir;

/// Walk `start` depth-first, calling `visit` for every entry including `start`.
///
/// Symbolic links, `start` included, are reported but never followed. Unless
/// `recursive` is set, directories other than `root` are visited without
/// descending into them.
/// The first error stops the walk; entries visited before it stay visited.
pub(crate) fn walk<F>(
    start: &Path,
    root: &Path,
    recursive: bool,
    mut visit: F,
) -> Result<(), walkdir::Error>
where
    F: FnMut(&Path, FileMetadata),
{
    let mut entries = WalkDir::new(start)
        .follow_links(false)
        .follow_root_links(false)
        .into_iter();

    while let Some(entry) = entries.next() {
        let entry = entry?;
        let metadata = FileMetadata::from(&entry.metadata()?);
        visit(entry.path(), metadata);

        if metadata.is_dir && !recursive && entry.path() != root {
            entries.skip_current_dir();
        }
    }

    Ok(())
}
