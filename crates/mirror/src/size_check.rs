//! Size check
//!
//! Read-only sanity pass over a finished conversion: every wma in the source
//! tree is compared with its mp3 counterpart, and conversions that shrank by
//! more than the deviation threshold are flagged. Corrupt or interrupted
//! encodes usually show up as truncated files.

use crate::error::{MirrorError, Result};
use crate::formats::{classify, converted_file_name, FileKind};
use crate::tree::{ensure_dir, walk_mirrored, MirrorEntry};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default deviation threshold in percent
pub const DEFAULT_DEVIATION_PERCENT: u32 = 40;

/// Result of comparing a converted file's size with its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeVerdict {
    /// Shrinkage within tolerance
    Within,
    /// Converted file lost more than the allowed share of the source size
    Shrunk,
}

/// Compare sizes against the deviation threshold.
///
/// Returns `Shrunk` if `target_bytes / source_bytes < 1 - deviation_percent / 100`.
/// Computed on integers so the boundary is exact: with a 40% threshold and a
/// 1000 byte source, 599 bytes is flagged and 600 is not.
pub fn check_shrinkage(source_bytes: u64, target_bytes: u64, deviation_percent: u32) -> SizeVerdict {
    let keep_percent = 100u128.saturating_sub(deviation_percent as u128);
    if (target_bytes as u128) * 100 < (source_bytes as u128) * keep_percent {
        SizeVerdict::Shrunk
    } else {
        SizeVerdict::Within
    }
}

/// Something worth a look, found by the size check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeFinding {
    /// Source file is zero bytes
    EmptySource { source: PathBuf },
    /// No converted file at the mirrored location
    Missing { target: PathBuf },
    /// Converted file much smaller than its source
    Shrunk {
        target: PathBuf,
        source_bytes: u64,
        target_bytes: u64,
    },
}

impl SizeFinding {
    /// Single-character flag leading the report line
    pub fn flag(&self) -> char {
        match self {
            SizeFinding::EmptySource { .. } => '0',
            SizeFinding::Missing { .. } => 'x',
            SizeFinding::Shrunk { .. } => '!',
        }
    }
}

impl fmt::Display for SizeFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeFinding::EmptySource { source } => {
                write!(f, "{} {} empty", self.flag(), source.display())
            }
            SizeFinding::Missing { target } => {
                write!(f, "{} {} missing", self.flag(), target.display())
            }
            SizeFinding::Shrunk {
                target,
                source_bytes,
                target_bytes,
            } => write!(
                f,
                "{} {} {} << {}",
                self.flag(),
                target.display(),
                target_bytes,
                source_bytes
            ),
        }
    }
}

/// Compares converted files with their sources.
#[derive(Debug, Clone)]
pub struct SizeChecker {
    deviation_percent: u32,
}

impl Default for SizeChecker {
    fn default() -> Self {
        Self::new(DEFAULT_DEVIATION_PERCENT)
    }
}

impl SizeChecker {
    pub fn new(deviation_percent: u32) -> Self {
        Self {
            deviation_percent: deviation_percent.min(100),
        }
    }

    pub fn deviation_percent(&self) -> u32 {
        self.deviation_percent
    }

    /// Check every wma under `source` against its mp3 under `target`.
    ///
    /// Findings are written to `report` as they are found and returned.
    /// Mirrored target directories are created if absent; nothing else is
    /// written.
    pub fn check_tree<W: Write>(
        &self,
        source: &Path,
        target: &Path,
        report: &mut W,
    ) -> Result<Vec<SizeFinding>> {
        tracing::info!(
            source = %source.display(),
            target = %target.display(),
            deviation_percent = self.deviation_percent,
            "checking converted sizes"
        );

        let mut findings = Vec::new();

        for entry in walk_mirrored(source, target) {
            match entry? {
                MirrorEntry::Dir { target, .. } => ensure_dir(&target)?,
                MirrorEntry::File { source, target_dir } => {
                    if classify(&source) != FileKind::Convertible {
                        continue;
                    }
                    if let Some(finding) = self.check_file(&source, &target_dir)? {
                        tracing::warn!(flag = %finding.flag(), "{}", finding);
                        writeln!(report, "{}", finding).map_err(MirrorError::Progress)?;
                        findings.push(finding);
                    }
                }
            }
        }

        tracing::info!(findings = findings.len(), "size check finished");
        Ok(findings)
    }

    /// An empty source is reported whether or not a destination exists.
    fn check_file(&self, source: &Path, target_dir: &Path) -> Result<Option<SizeFinding>> {
        let source_bytes = fs::metadata(source)
            .map_err(MirrorError::io("Failed to read size of", source))?
            .len();
        if source_bytes == 0 {
            return Ok(Some(SizeFinding::EmptySource {
                source: source.to_path_buf(),
            }));
        }

        let target = target_dir.join(converted_file_name(source));
        let target_bytes = match fs::metadata(&target) {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Ok(Some(SizeFinding::Missing { target })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Some(SizeFinding::Missing { target }))
            }
            Err(e) => return Err(MirrorError::io("Failed to read size of", &target)(e)),
        };

        match check_shrinkage(source_bytes, target_bytes, self.deviation_percent) {
            SizeVerdict::Within => Ok(None),
            SizeVerdict::Shrunk => Ok(Some(SizeFinding::Shrunk {
                target,
                source_bytes,
                target_bytes,
            })),
        }
    }
}
