//! Severity levels
//!
//! Five ordered levels with a fixed integer mapping used by configuration
//! and a bracketed literal used in the rendered line.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Ordered log severity
///
/// Ordering follows urgency: `Debug < Info < Warn < Error < Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// All severities, least severe first
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Map a configured integer level to a severity
    ///
    /// `-1` Debug, `0` Info, `1` Warn, `2` Error, `3` Fatal. Any other value
    /// is rejected; there is no fallback level.
    pub fn from_level(level: i8) -> Result<Self, ProtocolError> {
        match level {
            -1 => Ok(Self::Debug),
            0 => Ok(Self::Info),
            1 => Ok(Self::Warn),
            2 => Ok(Self::Error),
            3 => Ok(Self::Fatal),
            other => Err(ProtocolError::unknown_severity(other)),
        }
    }

    /// Integer level for this severity (inverse of `from_level`)
    #[inline]
    pub const fn level(self) -> i8 {
        match self {
            Self::Debug => -1,
            Self::Info => 0,
            Self::Warn => 1,
            Self::Error => 2,
            Self::Fatal => 3,
        }
    }

    /// Bracketed literal written after the message key, e.g. `[INFO]`
    #[inline]
    pub const fn literal(self) -> &'static str {
        match self {
            Self::Debug => "[DEBUG]",
            Self::Info => "[INFO]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
            Self::Fatal => "[FATAL]",
        }
    }

    /// Lowercase name
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// True for Error and Fatal
    #[inline]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }

    /// Parse a bracketed literal (`[WARN]`) or a bare name (`warn`, `WARNING`)
    pub fn from_literal(s: &str) -> Result<Self, ProtocolError> {
        let trimmed = s.trim();
        let name = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(trimmed);

        match name.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ProtocolError::unknown_literal(s)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.literal())
    }
}

impl FromStr for Severity {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_literal(s)
    }
}

impl TryFrom<i8> for Severity {
    type Error = ProtocolError;

    fn try_from(level: i8) -> Result<Self, ProtocolError> {
        Self::from_level(level)
    }
}
