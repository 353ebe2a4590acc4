//! CLI entry point for audiomirror
//!
//! Parses command line arguments, sets up logging, and dispatches to one of
//! the three modes: convert, size check, duplicate removal.

use audiomirror::config::ConfigError;
use audiomirror::{
    locate_encoder, program_dir, Config, Converter, DuplicateRemover, FfmpegEncoder, SizeChecker,
    CONVERTIBLE_EXTENSION, PASS_THROUGH_EXTENSION,
};
use clap::{CommandFactory, Parser};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = "\
Modes:
  audiomirror <SOURCE> <TARGET>
      Scan SOURCE recursively and mirror it into TARGET. wma files are
      transcoded to mp3, mp3 files are copied. Files already present in
      TARGET are skipped, so an interrupted run can simply be restarted.
      Progress: '.' skipped, '#' copied, '*' converted.

  audiomirror -c <SOURCE> <TARGET>
      Compare the size of every source wma with its converted mp3 and print
      any mp3 that is smaller than its source by more than the deviation
      threshold (40% unless configured). Corrupted conversions often result
      in truncated files.

  audiomirror -d <TARGET>
      Scan TARGET recursively and delete every \"name (1).mp3\" for which
      \"name.mp3\" exists in the same directory.

The encoder (ffmpeg) is looked up next to this program, then on PATH.
Set AUDIOMIRROR_ENCODER or [encoder] path in the config file to override.";

/// audiomirror - mirror a music library, transcoding wma to mp3
#[derive(Parser, Debug)]
#[command(name = "audiomirror")]
#[command(author, version, about, long_about = None, after_help = AFTER_HELP)]
struct Args {
    /// Check sizes of converted files against their sources
    #[arg(short = 'c', short_alias = 'C', conflicts_with = "dedupe")]
    check: bool,

    /// Remove "name (1).mp3" duplicates where "name.mp3" exists
    #[arg(short = 'd', short_alias = 'D')]
    dedupe: bool,

    /// With -d, list duplicates without deleting them
    #[arg(short = 'n', long, requires = "dedupe")]
    dry_run: bool,

    /// Path to an optional configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// SOURCE and TARGET, or only TARGET with -d
    #[arg(value_name = "PATH", num_args = 0..=2)]
    paths: Vec<PathBuf>,
}

#[derive(Debug, PartialEq)]
enum Mode {
    Convert { source: PathBuf, target: PathBuf },
    Check { source: PathBuf, target: PathBuf },
    Dedupe { target: PathBuf, dry_run: bool },
}

impl Args {
    /// The requested mode, or None when the arguments don't add up to one
    fn mode(&self) -> Option<Mode> {
        match (self.check, self.dedupe, self.paths.as_slice()) {
            (false, true, [target]) => Some(Mode::Dedupe {
                target: target.clone(),
                dry_run: self.dry_run,
            }),
            (true, false, [source, target]) => Some(Mode::Check {
                source: source.clone(),
                target: target.clone(),
            }),
            (false, false, [source, target]) => Some(Mode::Convert {
                source: source.clone(),
                target: target.clone(),
            }),
            _ => None,
        }
    }
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins; otherwise stay quiet unless asked, stdout carries progress
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("audiomirror=debug")
        } else {
            EnvFilter::new("audiomirror=error")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::from_env()),
    }
}

fn run(mode: Mode, config: &Config) -> audiomirror::Result<()> {
    let mut out = io::stdout();

    match mode {
        Mode::Convert { source, target } => {
            println!(
                "Converting all {} from {} to {}.",
                CONVERTIBLE_EXTENSION,
                source.display(),
                target.display()
            );
            let encoder = locate_encoder(config.encoder.path.as_deref(), program_dir().as_deref())?;
            tracing::info!(encoder = %encoder.display(), "encoder found");

            let converter = Converter::new(FfmpegEncoder::new(encoder));
            let summary = converter.convert_tree(&source, &target, &mut out)?;

            let _ = writeln!(out);
            println!(
                "Done: {} converted, {} copied, {} skipped, {} failed.",
                summary.converted,
                summary.copied,
                summary.skipped,
                summary.failures.len()
            );
        }
        Mode::Check { source, target } => {
            let checker = SizeChecker::new(config.check.deviation_percent);
            println!(
                "Checking relative sizes of all {} and {} from {} to {} (deviation {}%).",
                CONVERTIBLE_EXTENSION,
                PASS_THROUGH_EXTENSION,
                source.display(),
                target.display(),
                checker.deviation_percent()
            );
            let findings = checker.check_tree(&source, &target, &mut out)?;
            println!("{} file(s) flagged.", findings.len());
        }
        Mode::Dedupe { target, dry_run } => {
            println!("Removing duplicates from {}.", target.display());
            let removed = DuplicateRemover::new()
                .dry_run(dry_run)
                .remove_duplicates(&target, &mut out)?;
            if dry_run {
                println!("{} duplicate(s) found, nothing deleted.", removed.len());
            } else {
                println!("{} duplicate(s) removed.", removed.len());
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let mode = match args.mode() {
        Some(mode) => mode,
        None => {
            // Not enough to go on: show usage, not an error
            let _ = Args::command().print_help();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(mode, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
