//! kvtab Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid configuration.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use kvtab_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[log]\nmax_log_level = 1").unwrap();
//! assert_eq!(config.log.max_log_level, 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! max_log_level = 0
//! max_log_size_mb = 1024
//! max_log_file_num = 10
//! log_dir = "logs"
//! log_file_name = "app.log"
//!
//! [diagnostics]
//! level = "warn"
//! format = "console"
//! ```

mod error;
mod log;
mod logging;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use log::LogConfig;
pub use logging::{DiagnosticFormat, DiagnosticLevel, DiagnosticsConfig};

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log files written by the pipeline
    pub log: LogConfig,

    /// Internal diagnostics of kvtab itself
    pub diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.log.validate()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.log, LogConfig::default());
        assert_eq!(config.diagnostics, DiagnosticsConfig::default());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[log]
max_log_level = -1
max_log_size_mb = 64
max_log_file_num = 3
log_dir = "out"
log_file_name = "svc.log"
error_log_file_name = "svc-errors.log"
buffer_size = 4096
queue_size = 128
flush_interval_secs = 5
drain_grace_ms = 250

[diagnostics]
level = "debug"
format = "json"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.max_log_level, -1);
        assert_eq!(config.log.max_log_size_mb, 64);
        assert_eq!(config.log.max_log_file_num, 3);
        assert_eq!(config.log.error_log_file_name(), "svc-errors.log");
        assert_eq!(config.log.queue_size, 128);
        assert_eq!(config.log.drain_grace_ms, 250);
        assert_eq!(config.diagnostics.level, DiagnosticLevel::Debug);
        assert_eq!(config.diagnostics.format, DiagnosticFormat::Json);
    }

    #[test]
    fn test_invalid_level_fails_fast() {
        let result = Config::from_str("[log]\nmax_log_level = 9");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("[log\nmax_log_level = 0");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_wrong_type() {
        let result = Config::from_str("[log]\nqueue_size = \"big\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nlog_file_name = \"from-file.log\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.log.log_file_name, "from-file.log");
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
