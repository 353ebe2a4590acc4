//! Duplicate removal
//!
//! Deletes `<name> (1).mp3` files that sit next to a `<name>.mp3`. Only the
//! `(1)` suffix is recognized; `(2)` and above are left alone. The extension
//! matches in any case on both files, as it does everywhere else.

use crate::error::{MirrorError, Result};
use crate::formats::{canonical_of_duplicate, has_extension, PASS_THROUGH_EXTENSION};
use crate::tree::walk_files;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Removes duplicate-named mp3 files from a tree.
#[derive(Debug, Clone, Default)]
pub struct DuplicateRemover {
    dry_run: bool,
}

impl DuplicateRemover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report what would be removed without deleting anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Walk `root` and remove every duplicate whose original exists.
    ///
    /// Each removed path is written to `report` as `- <path>` and returned.
    pub fn remove_duplicates<W: Write>(&self, root: &Path, report: &mut W) -> Result<Vec<PathBuf>> {
        tracing::info!(root = %root.display(), dry_run = self.dry_run, "removing duplicates");

        let mut removed = Vec::new();

        for file in walk_files(root) {
            let file = file?;
            let canonical = match canonical_of_duplicate(&file) {
                Some(canonical) => canonical,
                None => continue,
            };
            let original = match find_original(&canonical)? {
                Some(original) => original,
                None => {
                    tracing::debug!(path = %file.display(), "no original next to duplicate, keeping");
                    continue;
                }
            };

            writeln!(report, "- {}", file.display()).map_err(MirrorError::Progress)?;
            if !self.dry_run {
                fs::remove_file(&file).map_err(MirrorError::io("Failed to delete", &file))?;
            }
            tracing::debug!(path = %file.display(), original = %original.display(), "removed duplicate");
            removed.push(file);
        }

        tracing::info!(removed = removed.len(), "duplicate removal finished");
        Ok(removed)
    }
}

/// Locate `canonical`, or a sibling differing only in extension case
/// (`track.mp3` for `track.MP3`).
fn find_original(canonical: &Path) -> Result<Option<PathBuf>> {
    if canonical.is_file() {
        return Ok(Some(canonical.to_path_buf()));
    }
    let (dir, stem) = match (canonical.parent(), canonical.file_stem()) {
        (Some(dir), Some(stem)) => (dir, stem),
        _ => return Ok(None),
    };

    let entries = fs::read_dir(dir).map_err(MirrorError::io("Failed to read directory", dir))?;
    for entry in entries {
        let path = entry
            .map_err(MirrorError::io("Failed to read directory", dir))?
            .path();
        if path.file_stem() == Some(stem)
            && has_extension(&path, PASS_THROUGH_EXTENSION)
            && path.is_file()
        {
            return Ok(Some(path));
        }
    }
    Ok(None)
}
