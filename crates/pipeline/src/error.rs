//! Pipeline error types

use std::io;
use std::path::PathBuf;

use kvtab_config::ConfigError;
use kvtab_protocol::{EncodeError, ProtocolError};
use kvtab_sinks::SinkError;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The record could not be encoded and was not delivered anywhere
    #[error(transparent)]
    Encode(EncodeError),

    /// One or more sinks failed; the others still received the line
    #[error("{} of {} sinks failed: {}", failures.len(), failures.len() + succeeded, summarize(failures))]
    Sinks {
        succeeded: usize,
        failures: Vec<SinkFailure>,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Log file could not be opened
    #[error("failed to open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A failure reported by one sink
#[derive(Debug, Error)]
#[error("{sink}: {error}")]
pub struct SinkFailure {
    /// Name the sink was registered under
    pub sink: String,

    #[source]
    pub error: SinkError,
}

fn summarize(failures: &[SinkFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PipelineError {
    /// Failures of individual sinks, empty for other variants
    pub fn sink_failures(&self) -> &[SinkFailure] {
        match self {
            Self::Sinks { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sinks_error_display() {
        let err = PipelineError::Sinks {
            succeeded: 1,
            failures: vec![SinkFailure {
                sink: "secondary".into(),
                error: SinkError::write("secondary", io::Error::other("disk full")),
            }],
        };

        let msg = err.to_string();
        assert!(msg.contains("1 of 2 sinks failed"));
        assert!(msg.contains("secondary"));
        assert!(msg.contains("disk full"));
        assert_eq!(err.sink_failures().len(), 1);
    }

    #[test]
    fn test_open_error_display() {
        let err = PipelineError::Open {
            path: PathBuf::from("/nope/app.log"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/nope/app.log"));
        assert!(err.sink_failures().is_empty());
    }
}
