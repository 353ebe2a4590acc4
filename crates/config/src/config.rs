//! Core configuration structures and loading logic

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the encoder executable
pub const ENV_ENCODER: &str = "AUDIOMIRROR_ENCODER";

/// Environment variable overriding the size check deviation threshold
pub const ENV_DEVIATION_PERCENT: &str = "AUDIOMIRROR_DEVIATION_PERCENT";

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
    /// A value parsed but is out of range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Encoder-related configuration
///
/// Only the location of the executable can be changed. Transcoding
/// parameters are fixed.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EncoderConfig {
    /// Explicit encoder executable (discovered next to the program or on PATH if None)
    pub path: Option<PathBuf>,
}

/// Size check configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckConfig {
    /// Maximum allowed shrinkage of a converted file, in percent of the source size
    #[serde(default = "default_deviation_percent")]
    pub deviation_percent: u32,
}

fn default_deviation_percent() -> u32 {
    40
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            deviation_percent: default_deviation_percent(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub check: CheckConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but make no sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check.deviation_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "check.deviation_percent must be between 0 and 100, got {}",
                self.check.deviation_percent
            )));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// - AUDIOMIRROR_ENCODER -> encoder.path
    /// - AUDIOMIRROR_DEVIATION_PERCENT -> check.deviation_percent
    ///
    /// Values that fail to parse or fall out of range are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var(ENV_ENCODER) {
            if !val.trim().is_empty() {
                self.encoder.path = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = env::var(ENV_DEVIATION_PERCENT) {
            if let Ok(percent) = val.trim().parse::<u32>() {
                if percent <= 100 {
                    self.check.deviation_percent = percent;
                }
            }
        }
    }

    /// Load configuration from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Built-in defaults with environment overrides, used when no file is given
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;

    // Env var tests must not interleave
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env_vars() {
        env::remove_var(ENV_ENCODER);
        env::remove_var(ENV_DEVIATION_PERCENT);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_config_parses_all_sections(
            encoder in proptest::option::of("[a-z]{1,8}(/[a-z0-9_]{1,8}){0,3}"),
            deviation in 0u32..=100,
        ) {
            let toml_str = format!(
                r#"
[encoder]
{}

[check]
deviation_percent = {}
"#,
                encoder.as_ref().map(|p| format!("path = \"{}\"", p)).unwrap_or_default(),
                deviation
            );

            let config = Config::parse_toml(&toml_str).expect("Valid TOML should parse");

            prop_assert_eq!(config.encoder.path, encoder.map(PathBuf::from));
            prop_assert_eq!(config.check.deviation_percent, deviation);
        }

        #[test]
        fn prop_deviation_above_hundred_rejected(deviation in 101u32..10_000) {
            let toml_str = format!("[check]\ndeviation_percent = {}\n", deviation);
            let result = Config::parse_toml(&toml_str);
            prop_assert!(matches!(result, Err(ConfigError::Invalid(_))));
        }

        #[test]
        fn prop_env_overrides_deviation_percent(
            initial in 0u32..=100,
            override_percent in 0u32..=100,
        ) {
            let _guard = ENV_MUTEX.lock().unwrap();
            clear_env_vars();

            let toml_str = format!("[check]\ndeviation_percent = {}\n", initial);
            let mut config = Config::parse_toml(&toml_str).expect("Valid TOML");

            env::set_var(ENV_DEVIATION_PERCENT, override_percent.to_string());
            config.apply_env_overrides();
            clear_env_vars();

            prop_assert_eq!(config.check.deviation_percent, override_percent);
        }
    }

    #[test]
    fn test_env_overrides_encoder_path() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let mut config = Config::default();
        env::set_var(ENV_ENCODER, "/opt/ffmpeg/bin/ffmpeg");
        config.apply_env_overrides();
        clear_env_vars();

        assert_eq!(
            config.encoder.path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
    }

    #[test]
    fn test_env_override_out_of_range_is_ignored() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let mut config = Config::default();
        env::set_var(ENV_DEVIATION_PERCENT, "250");
        config.apply_env_overrides();
        env::set_var(ENV_DEVIATION_PERCENT, "lots");
        config.apply_env_overrides();
        clear_env_vars();

        assert_eq!(config.check.deviation_percent, 40);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse_toml("").expect("Empty TOML should parse");

        assert_eq!(config.encoder.path, None);
        assert_eq!(config.check.deviation_percent, 40);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let toml_str = r#"
[encoder]
path = "tools/ffmpeg"
"#;
        let config = Config::parse_toml(toml_str).expect("Partial TOML should parse");

        assert_eq!(config.encoder.path, Some(PathBuf::from("tools/ffmpeg")));
        assert_eq!(config.check.deviation_percent, 40); // default
    }

    #[test]
    fn test_load_from_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("audiomirror.toml");
        fs::write(&path, "[check]\ndeviation_percent = 25\n").unwrap();

        let config = Config::load(&path).expect("Config file should load");
        assert_eq!(config.check.deviation_percent, 25);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
