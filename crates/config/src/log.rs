//! Log file configuration
//!
//! Where log lines go, which severities are kept, and how the write path is
//! tuned. Every field has a default, so an empty `[log]` section is valid.
//!
//! # Example
//!
//! ```toml
//! [log]
//! max_log_level = -1          # -1 debug, 0 info, 1 warn, 2 error, 3 fatal
//! max_log_size_mb = 512
//! max_log_file_num = 5
//! log_dir = "/var/log/myapp"
//! log_file_name = "myapp.log" # errors go to "error-myapp.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use kvtab_protocol::Severity;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

const SECTION: &str = "log";

/// Log file configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum severity written to the main file, as an integer level
    /// Default: 0 (info)
    pub max_log_level: i8,

    /// Size at which a log file is rotated, in megabytes
    /// Default: 1024
    pub max_log_size_mb: u64,

    /// Rotated backups kept per file (0 keeps all)
    /// Default: 10
    pub max_log_file_num: usize,

    /// Directory holding both log files
    /// Default: "logs"
    pub log_dir: PathBuf,

    /// Main log file name (all enabled severities)
    /// Default: executable name + ".log"
    pub log_file_name: String,

    /// Error log file name (error and fatal only)
    /// Default: "error-" + log_file_name
    pub error_log_file_name: Option<String>,

    /// In-memory buffer in front of each file, in bytes
    /// Default: 262144 (256KB)
    pub buffer_size: usize,

    /// Queue capacity of each async sink, in lines
    /// Default: 10000
    pub queue_size: usize,

    /// Periodic flush interval, in seconds
    /// Default: 20
    pub flush_interval_secs: u64,

    /// Per-line drain window on shutdown, in milliseconds
    /// Default: 100
    pub drain_grace_ms: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_log_level: 0,
            max_log_size_mb: 1024,
            max_log_file_num: 10,
            log_dir: PathBuf::from("logs"),
            log_file_name: default_log_file_name(),
            error_log_file_name: None,
            buffer_size: 256 * 1024,
            queue_size: 10_000,
            flush_interval_secs: 20,
            drain_grace_ms: 100,
        }
    }
}

/// `<executable>.log`, or `kvtab.log` when the executable name is unknown
fn default_log_file_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_stem)
        .map(|name| format!("{}.log", name.to_string_lossy()))
        .unwrap_or_else(|| "kvtab.log".into())
}

impl LogConfig {
    /// Severity threshold of the main file
    ///
    /// Fails for levels outside -1..=3; there is no fallback level.
    pub fn severity(&self) -> Result<Severity> {
        Severity::from_level(self.max_log_level).map_err(|e| {
            ConfigError::invalid_value(SECTION, "max_log_level", e.to_string())
        })
    }

    /// Error log file name, derived from the main file name when unset
    pub fn error_log_file_name(&self) -> String {
        self.error_log_file_name
            .clone()
            .unwrap_or_else(|| format!("error-{}", self.log_file_name))
    }

    /// Full path of the main log file
    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file_name)
    }

    /// Full path of the error log file
    pub fn error_log_file_path(&self) -> PathBuf {
        self.log_dir.join(self.error_log_file_name())
    }

    /// Rotation size in bytes
    #[inline]
    pub fn max_size_bytes(&self) -> u64 {
        self.max_log_size_mb.saturating_mul(1024 * 1024)
    }

    #[inline]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    #[inline]
    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }

    /// Check every field for usable values
    pub fn validate(&self) -> Result<()> {
        self.severity()?;

        if self.max_log_size_mb == 0 {
            return Err(ConfigError::invalid_value(
                SECTION,
                "max_log_size_mb",
                "must be greater than zero",
            ));
        }
        if self.log_file_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                SECTION,
                "log_file_name",
                "must not be empty",
            ));
        }
        if self.error_log_file_name() == self.log_file_name {
            return Err(ConfigError::invalid_value(
                SECTION,
                "error_log_file_name",
                "must differ from log_file_name",
            ));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::invalid_value(
                SECTION,
                "buffer_size",
                "must be greater than zero",
            ));
        }
        if self.queue_size == 0 {
            return Err(ConfigError::invalid_value(
                SECTION,
                "queue_size",
                "must be greater than zero",
            ));
        }
        if self.flush_interval_secs == 0 {
            return Err(ConfigError::invalid_value(
                SECTION,
                "flush_interval_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "log_test.rs"]
mod log_test;
