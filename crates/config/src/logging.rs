//! Diagnostics configuration
//!
//! Controls the `tracing` output of kvtab itself (sink lifecycle, rotation,
//! drain reports). This is separate from the `[log]` section, which
//! configures the log files kvtab writes.

use serde::Deserialize;

/// Diagnostic level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Trace level - very verbose
    Trace,
    /// Debug level - debugging information
    Debug,
    /// Info level - normal operation
    Info,
    /// Warn level - warnings only (default)
    #[default]
    Warn,
    /// Error level - errors only
    Error,
}

impl DiagnosticLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Diagnostic output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON structured logging
    Json,
}

/// Diagnostics configuration
///
/// # Example
///
/// ```toml
/// [diagnostics]
/// level = "info"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Level (trace, debug, info, warn, error)
    /// Default: warn
    pub level: DiagnosticLevel,

    /// Output format (console, json)
    /// Default: console
    pub format: DiagnosticFormat,
}
