//! Scratch workspace for a single conversion.
//!
//! The source file is staged into a private temporary directory and the
//! encoder writes its output next to it. The directory is removed when the
//! [`Scratch`] is dropped, whichever way the conversion ends.

use crate::error::{MirrorError, Result};
use crate::formats::{CONVERTIBLE_EXTENSION, PASS_THROUGH_EXTENSION};
use crate::tree::copy_no_clobber;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCRATCH_PREFIX: &str = "audiomirror-";

/// Temporary staging area for one transcode.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create a fresh scratch directory under the system temp location.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(MirrorError::io(
                "Failed to create scratch directory",
                std::env::temp_dir(),
            ))?;
        Ok(Self { dir })
    }

    /// Create a scratch directory under `parent` instead of the system temp location.
    pub fn new_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)
            .map_err(MirrorError::io("Failed to create scratch directory", parent))?;
        Ok(Self { dir })
    }

    /// Where the staged copy of the source lives.
    pub fn input(&self) -> PathBuf {
        self.dir
            .path()
            .join(format!("input.{}", CONVERTIBLE_EXTENSION))
    }

    /// Where the encoder is told to write.
    pub fn output(&self) -> PathBuf {
        self.dir
            .path()
            .join(format!("output.{}", PASS_THROUGH_EXTENSION))
    }

    /// Path to the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy `source` into the staging slot.
    pub fn stage(&self, source: &Path) -> Result<PathBuf> {
        let input = self.input();
        fs::copy(source, &input).map_err(MirrorError::io("Failed to copy", source))?;
        Ok(input)
    }

    /// Put the encoder output at `destination` if the encoder produced one.
    ///
    /// Returns whether there was output. The file only appears at
    /// `destination` once fully written, and a file already there is never
    /// replaced. The scratch copy goes away with the [`Scratch`].
    pub fn take_output(&self, destination: &Path) -> Result<bool> {
        let output = self.output();
        if !output.is_file() {
            return Ok(false);
        }

        if !copy_no_clobber(&output, destination)? {
            tracing::debug!(path = %destination.display(), "destination appeared meanwhile, keeping it");
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scratch_removed_on_drop() {
        let parent = TempDir::new().unwrap();
        let scratch = Scratch::new_in(parent.path()).unwrap();
        let dir = scratch.path().to_path_buf();
        assert!(dir.is_dir());

        drop(scratch);
        assert!(!dir.exists(), "Scratch directory should be gone after drop");
    }

    #[test]
    fn test_each_scratch_is_private() {
        let parent = TempDir::new().unwrap();
        let first = Scratch::new_in(parent.path()).unwrap();
        let second = Scratch::new_in(parent.path()).unwrap();
        assert_ne!(first.input(), second.input());
        assert_ne!(first.output(), second.output());
    }

    #[test]
    fn test_stage_copies_source() {
        let parent = TempDir::new().unwrap();
        let source = parent.path().join("song.wma");
        fs::write(&source, b"wma bytes").unwrap();

        let scratch = Scratch::new_in(parent.path()).unwrap();
        let staged = scratch.stage(&source).unwrap();

        assert_eq!(fs::read(&staged).unwrap(), b"wma bytes");
        assert!(source.exists(), "Source must be left in place");
    }

    #[test]
    fn test_stage_missing_source_is_error() {
        let parent = TempDir::new().unwrap();
        let scratch = Scratch::new_in(parent.path()).unwrap();
        let result = scratch.stage(&parent.path().join("missing.wma"));
        assert!(matches!(result, Err(MirrorError::Io { .. })));
    }

    #[test]
    fn test_take_output_moves_file() {
        let parent = TempDir::new().unwrap();
        let scratch = Scratch::new_in(parent.path()).unwrap();
        fs::write(scratch.output(), b"mp3 bytes").unwrap();

        let destination = parent.path().join("song.mp3");
        assert!(scratch.take_output(&destination).unwrap());
        assert_eq!(fs::read(&destination).unwrap(), b"mp3 bytes");

        let output = scratch.output();
        drop(scratch);
        assert!(!output.exists());
    }

    #[test]
    fn test_take_output_never_replaces_destination() {
        let parent = TempDir::new().unwrap();
        let scratch = Scratch::new_in(parent.path()).unwrap();
        fs::write(scratch.output(), b"fresh encode").unwrap();

        let destination = parent.path().join("song.mp3");
        fs::write(&destination, b"already there").unwrap();

        assert!(scratch.take_output(&destination).unwrap());
        assert_eq!(fs::read(&destination).unwrap(), b"already there");
    }

    #[test]
    fn test_take_output_into_missing_directory_leaves_nothing() {
        let parent = TempDir::new().unwrap();
        let scratch = Scratch::new_in(parent.path()).unwrap();
        fs::write(scratch.output(), b"mp3 bytes").unwrap();

        let destination = parent.path().join("gone/song.mp3");
        let result = scratch.take_output(&destination);

        assert!(matches!(result, Err(MirrorError::Io { .. })));
        assert!(!destination.exists());
    }

    #[test]
    fn test_take_output_without_output() {
        let parent = TempDir::new().unwrap();
        let scratch = Scratch::new_in(parent.path()).unwrap();

        let destination = parent.path().join("song.mp3");
        assert!(!scratch.take_output(&destination).unwrap());
        assert!(!destination.exists());
    }
}
