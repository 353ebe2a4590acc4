//! Converter
//!
//! Mirrors a source tree into a target tree: mp3 files are copied verbatim,
//! wma files are transcoded through an [`Encoder`]. Anything already present
//! at the destination is left alone, so re-running only does missing work.
//!
//! Progress goes to a caller-supplied writer, one marker per file:
//! `.` skipped, `#` copied, `*` converted.

use crate::encode::{EncodeStatus, Encoder};
use crate::error::{MirrorError, Result};
use crate::formats::{classify, converted_file_name, FileKind};
use crate::scratch::Scratch;
use crate::tree::{copy_no_clobber, ensure_dir, walk_mirrored, MirrorEntry};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Marker for a file whose destination already exists
pub const MARK_SKIPPED: char = '.';
/// Marker for a pass-through file copied to the target
pub const MARK_COPIED: char = '#';
/// Marker for a successful conversion
pub const MARK_CONVERTED: char = '*';

/// Why a conversion counts as failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Encoder exited with a non-zero code
    ExitCode(i32),
    /// Encoder was terminated by a signal
    Signal,
    /// Encoder exited cleanly but wrote nothing
    NoOutput,
}

/// A source file that could not be converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub source: PathBuf,
    pub reason: FailureReason,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ExitCode(code) => write!(f, "{}", code),
            FailureReason::Signal => write!(f, "signal"),
            FailureReason::NoOutput => write!(f, "no output"),
        }
    }
}

/// `Error <code> while converting <path>.`, with `signal` or `no output` in
/// place of the code when there is none.
impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error {} while converting {}.",
            self.reason,
            self.source.display()
        )
    }
}

/// Counts for a finished convert run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Directories mirrored, including the root
    pub directories: usize,
    /// Files whose destination already existed
    pub skipped: usize,
    /// Pass-through files copied
    pub copied: usize,
    /// Files transcoded successfully
    pub converted: usize,
    /// Files the encoder failed on
    pub failures: Vec<ConversionFailure>,
}

impl ConvertSummary {
    /// Files written to the target during the run
    pub fn written(&self) -> usize {
        self.copied + self.converted
    }
}

/// Outcome for a single file
#[derive(Debug, Clone, PartialEq, Eq)]
enum FileOutcome {
    Skipped,
    Copied,
    Converted,
    Failed(FailureReason),
}

/// Walks a source tree and fills in the target tree.
#[derive(Debug)]
pub struct Converter<E> {
    encoder: E,
    scratch_root: Option<PathBuf>,
}

impl<E: Encoder> Converter<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            scratch_root: None,
        }
    }

    /// Stage conversions under `dir` instead of the system temp location
    pub fn with_scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(dir.into());
        self
    }

    /// Mirror `source` into `target`.
    ///
    /// Filesystem errors end the run. Encoder failures are written to
    /// `progress`, collected in the summary, and the walk carries on.
    pub fn convert_tree<W: Write>(
        &self,
        source: &Path,
        target: &Path,
        progress: &mut W,
    ) -> Result<ConvertSummary> {
        tracing::info!(source = %source.display(), target = %target.display(), "converting tree");

        let mut summary = ConvertSummary::default();

        for entry in walk_mirrored(source, target) {
            match entry? {
                MirrorEntry::Dir { source, target } => {
                    writeln!(progress)
                        .and_then(|_| writeln!(progress, "{} -> {}", source.display(), target.display()))
                        .map_err(MirrorError::Progress)?;
                    ensure_dir(&target)?;
                    summary.directories += 1;
                }
                MirrorEntry::File { source, target_dir } => {
                    let outcome = match classify(&source) {
                        FileKind::PassThrough => self.copy_pass_through(&source, &target_dir)?,
                        FileKind::Convertible => self.convert_file(&source, &target_dir)?,
                        FileKind::Other => continue,
                    };
                    record(&mut summary, &source, outcome, progress)?;
                }
            }
        }

        tracing::info!(
            directories = summary.directories,
            skipped = summary.skipped,
            copied = summary.copied,
            converted = summary.converted,
            failed = summary.failures.len(),
            "conversion finished"
        );

        Ok(summary)
    }

    fn copy_pass_through(&self, source: &Path, target_dir: &Path) -> Result<FileOutcome> {
        let file_name = match source.file_name() {
            Some(name) => name,
            None => return Ok(FileOutcome::Skipped),
        };
        let destination = target_dir.join(file_name);

        if destination.exists() {
            tracing::debug!(path = %destination.display(), "already present, skipping");
            return Ok(FileOutcome::Skipped);
        }

        if copy_no_clobber(source, &destination)? {
            tracing::debug!(from = %source.display(), to = %destination.display(), "copied");
            Ok(FileOutcome::Copied)
        } else {
            Ok(FileOutcome::Skipped)
        }
    }

    fn convert_file(&self, source: &Path, target_dir: &Path) -> Result<FileOutcome> {
        let destination = target_dir.join(converted_file_name(source));

        if destination.exists() {
            tracing::debug!(path = %destination.display(), "already converted, skipping");
            return Ok(FileOutcome::Skipped);
        }

        let scratch = match &self.scratch_root {
            Some(root) => Scratch::new_in(root)?,
            None => Scratch::new()?,
        };
        let input = scratch.stage(source)?;

        tracing::debug!(source = %source.display(), "transcoding");
        let status = self.encoder.transcode(&input, &scratch.output())?;
        let produced = scratch.take_output(&destination)?;
        drop(scratch);

        Ok(judge(status, produced))
    }
}

fn judge(status: EncodeStatus, produced: bool) -> FileOutcome {
    match status.code {
        Some(0) if produced => FileOutcome::Converted,
        Some(0) => FileOutcome::Failed(FailureReason::NoOutput),
        Some(code) => FileOutcome::Failed(FailureReason::ExitCode(code)),
        None => FileOutcome::Failed(FailureReason::Signal),
    }
}

fn record<W: Write>(
    summary: &mut ConvertSummary,
    source: &Path,
    outcome: FileOutcome,
    progress: &mut W,
) -> Result<()> {
    let written = match outcome {
        FileOutcome::Skipped => {
            summary.skipped += 1;
            write!(progress, "{}", MARK_SKIPPED)
        }
        FileOutcome::Copied => {
            summary.copied += 1;
            write!(progress, "{}", MARK_COPIED)
        }
        FileOutcome::Converted => {
            summary.converted += 1;
            write!(progress, "{}", MARK_CONVERTED)
        }
        FileOutcome::Failed(reason) => {
            let failure = ConversionFailure {
                source: source.to_path_buf(),
                reason,
            };
            tracing::warn!(source = %source.display(), reason = ?failure.reason, "conversion failed");
            let line = writeln!(progress).and_then(|_| writeln!(progress, "{}", failure));
            summary.failures.push(failure);
            line
        }
    };
    written
        .and_then(|_| progress.flush())
        .map_err(MirrorError::Progress)
}
