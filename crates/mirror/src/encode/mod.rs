//! Encoding modules for audiomirror

pub mod discover;
pub mod ffmpeg;

pub use discover::{encoder_file_name, locate_encoder, program_dir, ENCODER_NAME};
pub use ffmpeg::{
    build_ffmpeg_command, FfmpegEncoder, AUDIO_BITRATE, AUDIO_CHANNELS, AUDIO_CODEC,
    AUDIO_SAMPLE_RATE,
};

use std::path::Path;
use thiserror::Error;

/// Error type for encoding operations
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Encoder process could not be started
    #[error("Failed to start encoder {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// How an encoder process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeStatus {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl EncodeStatus {
    pub fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Transcodes a single file.
///
/// Implementations block until the transcode has finished. A non-zero exit
/// is reported through [`EncodeStatus`], not as an error.
pub trait Encoder {
    fn transcode(&self, input: &Path, output: &Path) -> Result<EncodeStatus, EncodeError>;
}

impl<E: Encoder + ?Sized> Encoder for &E {
    fn transcode(&self, input: &Path, output: &Path) -> Result<EncodeStatus, EncodeError> {
        (**self).transcode(input, output)
    }
}
