//! FFmpeg encoder module for audiomirror
//!
//! Builds and runs the ffmpeg command that turns a staged wma file into an
//! mp3 with fixed parameters.

use super::{EncodeError, EncodeStatus, Encoder};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Audio codec passed to `-acodec`
pub const AUDIO_CODEC: &str = "libmp3lame";

/// Target bitrate passed to `-ab`
pub const AUDIO_BITRATE: &str = "160k";

/// Channel count passed to `-ac`
pub const AUDIO_CHANNELS: u32 = 2;

/// Sample rate in Hz passed to `-ar`
pub const AUDIO_SAMPLE_RATE: u32 = 44100;

/// Build the ffmpeg transcoding command
///
/// `<program> -i <input> -acodec libmp3lame -ab 160k -ac 2 -ar 44100 <output>`
///
/// Stdin is closed so ffmpeg never waits on an interactive prompt.
pub fn build_ffmpeg_command(program: &Path, input: &Path, output: &Path) -> Command {
    let mut cmd = Command::new(program);

    cmd.arg("-i").arg(input);
    cmd.arg("-acodec").arg(AUDIO_CODEC);
    cmd.arg("-ab").arg(AUDIO_BITRATE);
    cmd.arg("-ac").arg(AUDIO_CHANNELS.to_string());
    cmd.arg("-ar").arg(AUDIO_SAMPLE_RATE.to_string());
    cmd.arg(output);

    cmd.stdin(Stdio::null());

    cmd
}

/// Runs an ffmpeg executable as a subprocess for each transcode.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Encoder for FfmpegEncoder {
    /// Run ffmpeg and wait for it to exit.
    ///
    /// Output is captured rather than shown; on failure the last line of
    /// stderr is logged at debug level.
    fn transcode(&self, input: &Path, output: &Path) -> Result<EncodeStatus, EncodeError> {
        let mut cmd = build_ffmpeg_command(&self.program, input, output);

        let result = cmd.output().map_err(|source| EncodeError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let status = EncodeStatus {
            code: result.status.code(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            if let Some(last_line) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                tracing::debug!(program = %self.program.display(), "encoder stderr: {}", last_line);
            }
        }

        Ok(status)
    }
}
