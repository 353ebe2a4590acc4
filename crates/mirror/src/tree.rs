//! Mirrored tree walk.
//!
//! Walks a source tree depth-first and pairs every entry with its mirrored
//! location under a target root. Within a directory, subdirectories are
//! visited (fully) before the directory's own files; both groups are sorted
//! by name so progress output is stable between runs.

use crate::error::{MirrorError, Result};
use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// An entry of the source tree with its mirrored counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEntry {
    /// A directory, including the root itself.
    Dir { source: PathBuf, target: PathBuf },
    /// A regular file. `target_dir` is the mirrored parent directory.
    File { source: PathBuf, target_dir: PathBuf },
}

fn dirs_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    b_dir
        .cmp(&a_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Iterates over `source_root`, yielding each entry paired with its place
/// under `target_root`.
///
/// Walk errors are yielded, not skipped: callers treat an unreadable
/// directory as fatal.
pub fn walk_mirrored<'a>(
    source_root: &'a Path,
    target_root: &'a Path,
) -> impl Iterator<Item = Result<MirrorEntry>> + 'a {
    WalkDir::new(source_root)
        .follow_links(true)
        .sort_by(dirs_first)
        .into_iter()
        .map(move |entry| -> Result<Option<MirrorEntry>> {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(source_root)
                .unwrap_or_else(|_| Path::new(""));

            if entry.file_type().is_dir() {
                let target = if relative.as_os_str().is_empty() {
                    target_root.to_path_buf()
                } else {
                    target_root.join(relative)
                };
                Ok(Some(MirrorEntry::Dir {
                    source: entry.into_path(),
                    target,
                }))
            } else if entry.file_type().is_file() {
                let target_dir = relative
                    .parent()
                    .map(|parent| target_root.join(parent))
                    .unwrap_or_else(|| target_root.to_path_buf());
                Ok(Some(MirrorEntry::File {
                    source: entry.into_path(),
                    target_dir,
                }))
            } else {
                Ok(None)
            }
        })
        .filter_map(Result::transpose)
}

/// Iterates over every regular file below `root`, in the same order as
/// [`walk_mirrored`].
pub fn walk_files(root: &Path) -> impl Iterator<Item = Result<PathBuf>> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by(dirs_first)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(MirrorError::from(e))),
        })
}

/// Creates `dir` and any missing ancestors.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(MirrorError::io("Failed to create directory", dir))
}

/// Copy `source` to `destination` without ever replacing an existing file.
///
/// Bytes go to a hidden temporary file next to `destination`, which is only
/// renamed into place once complete. A failed copy leaves nothing behind.
/// Returns false when `destination` already exists.
pub fn copy_no_clobber(source: &Path, destination: &Path) -> Result<bool> {
    let parent = destination.parent().unwrap_or_else(|| Path::new("."));

    let mut reader = File::open(source).map_err(MirrorError::io("Failed to open", source))?;
    let mut partial = tempfile::Builder::new()
        .prefix(".audiomirror-")
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(MirrorError::io("Failed to create temporary file in", parent))?;
    io::copy(&mut reader, partial.as_file_mut())
        .map_err(MirrorError::io("Failed to copy", source))?;

    match partial.persist_noclobber(destination) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(MirrorError::io("Failed to create", destination)(e.error)),
    }
}
