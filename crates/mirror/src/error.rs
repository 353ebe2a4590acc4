//! Error type shared by the three operating modes.

use crate::encode::EncodeError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for mirror operations
///
/// Anything surfacing here ends the run. Encoder exit codes are not errors;
/// they are reported per file and the walk continues.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Directory walk failed (unreadable directory, broken link, loop)
    #[error("Failed to walk directory tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// Filesystem operation failed on a specific path
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoder could not be run at all
    #[error("Encoder failed: {0}")]
    Encode(#[from] EncodeError),

    /// Encoder executable could not be located
    #[error("Couldn't find the encoder (looked for {0})")]
    EncoderNotFound(String),

    /// Progress stream could not be written
    #[error("Failed to write progress: {0}")]
    Progress(#[source] std::io::Error),
}

impl MirrorError {
    /// Error mapper for `map_err`, tagging an I/O error with what was being done to which path
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| MirrorError::Io {
            action,
            path,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
