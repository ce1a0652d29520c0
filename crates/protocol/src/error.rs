//! Protocol error types
//!
//! Errors that can occur when mapping severities or encoding records.

use bytes::BytesMut;
use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Integer level outside the -1..=3 mapping
    #[error("unknown severity level {0}: expected -1 (debug) through 3 (fatal)")]
    UnknownSeverity(i64),

    /// Severity literal that matches none of the five levels
    #[error("unknown severity literal '{0}'")]
    UnknownSeverityLiteral(String),

    /// Field payload could not be serialized
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl ProtocolError {
    /// Create an unknown severity error
    #[inline]
    pub fn unknown_severity(level: impl Into<i64>) -> Self {
        Self::UnknownSeverity(level.into())
    }

    /// Create an unknown literal error
    #[inline]
    pub fn unknown_literal(literal: impl Into<String>) -> Self {
        Self::UnknownSeverityLiteral(literal.into())
    }
}

/// A field value failed to serialize while encoding a record
///
/// Carries the bytes already written for the line. Earlier header tokens
/// and fields are intact; the failing field contributes nothing and the
/// line ending is missing.
#[derive(Debug, Error)]
#[error("failed to encode field '{key}': {source}")]
pub struct EncodeError {
    /// Key of the field that failed
    pub key: String,

    /// Underlying serialization error
    #[source]
    pub source: serde_json::Error,

    /// Line bytes written before the failure
    pub partial: BytesMut,
}

impl EncodeError {
    /// Consume the error and take the partial line buffer
    pub fn into_partial(self) -> BytesMut {
        self.partial
    }
}
