//! audiomirror
//!
//! Mirrors a music tree, transcoding wma files to mp3 with an external
//! encoder and copying mp3 files verbatim. Also provides a size sanity check
//! of converted files and removal of `(1)`-suffixed duplicates.

pub mod convert;
pub mod dedupe;
pub mod encode;
pub mod error;
pub mod formats;
pub mod scratch;
pub mod size_check;
pub mod tree;

pub use audiomirror_config as config;
pub use audiomirror_config::Config;
pub use convert::{ConversionFailure, ConvertSummary, Converter, FailureReason};
pub use dedupe::DuplicateRemover;
pub use encode::{
    build_ffmpeg_command, locate_encoder, program_dir, EncodeError, EncodeStatus, Encoder,
    FfmpegEncoder,
};
pub use error::{MirrorError, Result};
pub use formats::{classify, FileKind, CONVERTIBLE_EXTENSION, PASS_THROUGH_EXTENSION};
pub use size_check::{check_shrinkage, SizeChecker, SizeFinding, SizeVerdict};
