//! Encoder discovery
//!
//! Finds the encoder executable before any work starts. Convert mode aborts
//! when nothing is found.

use crate::error::{MirrorError, Result};
use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

/// Base name of the encoder executable
pub const ENCODER_NAME: &str = "ffmpeg";

/// Encoder file name with the platform executable suffix (`ffmpeg.exe` on Windows)
pub fn encoder_file_name() -> String {
    format!("{}{}", ENCODER_NAME, EXE_SUFFIX)
}

/// Locate the encoder executable
///
/// Checked in order:
/// 1. `configured`, when given; it must exist
/// 2. the encoder next to the running program (`program_dir`)
/// 3. the encoder on `PATH`
pub fn locate_encoder(configured: Option<&Path>, program_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(MirrorError::EncoderNotFound(path.display().to_string()));
    }

    let file_name = encoder_file_name();
    let mut looked_in = Vec::new();

    if let Some(dir) = program_dir {
        let beside = dir.join(&file_name);
        if beside.is_file() {
            tracing::debug!(path = %beside.display(), "using encoder next to the program");
            return Ok(beside);
        }
        looked_in.push(beside.display().to_string());
    }

    match which::which(ENCODER_NAME) {
        Ok(found) => {
            tracing::debug!(path = %found.display(), "using encoder from PATH");
            Ok(found)
        }
        Err(_) => {
            looked_in.push(format!("{} on PATH", file_name));
            Err(MirrorError::EncoderNotFound(looked_in.join(", ")))
        }
    }
}

/// Directory containing the running executable, if it can be determined
pub fn program_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
