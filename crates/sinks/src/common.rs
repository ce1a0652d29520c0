//! Common types shared by all sinks

use std::fs::File;
use std::io::{self, Write};

use thiserror::Error;

use crate::async_sink::DrainReport;

/// Raw sink contract
///
/// A byte writer that can also make written data durable. `flush` pushes
/// buffered bytes downstream; `sync` additionally asks the destination to
/// persist them (for files: `sync_data`).
pub trait WriteSync: Write + Send {
    fn sync(&mut self) -> io::Result<()>;
}

impl<W: WriteSync + ?Sized> WriteSync for Box<W> {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

impl WriteSync for File {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_data()
    }
}

impl WriteSync for Vec<u8> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteSync for io::Sink {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteSync for io::Stdout {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl WriteSync for io::Stderr {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Common sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink could not be created
    #[error("failed to initialize sink '{sink}': {message}")]
    Init { sink: String, message: String },

    /// Synchronous write to the downstream failed
    #[error("write failed on sink '{sink}': {source}")]
    Write {
        sink: String,
        #[source]
        source: io::Error,
    },

    /// Flushing or syncing the downstream failed
    #[error("flush failed on sink '{sink}': {source}")]
    Flush {
        sink: String,
        #[source]
        source: io::Error,
    },

    /// Consumer writes failed since the last sync
    #[error("{count} background write(s) failed on sink '{sink}', last error: {last_error}")]
    Background {
        sink: String,
        count: u64,
        last_error: String,
    },

    /// Drain finished but the final sync failed
    #[error(
        "shutdown of sink '{sink}' failed ({} drained, {} discarded): {source}",
        report.drained,
        report.discarded
    )]
    Shutdown {
        sink: String,
        report: DrainReport,
        #[source]
        source: Box<SinkError>,
    },

    /// Consumer task panicked or was aborted
    #[error("consumer task of sink '{sink}' failed: {message}")]
    Task { sink: String, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Init {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a write error
    pub fn write(sink: impl Into<String>, source: io::Error) -> Self {
        Self::Write {
            sink: sink.into(),
            source,
        }
    }

    /// Create a flush error
    pub fn flush(sink: impl Into<String>, source: io::Error) -> Self {
        Self::Flush {
            sink: sink.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Name of the sink the error came from, if any
    pub fn sink(&self) -> Option<&str> {
        match self {
            Self::Init { sink, .. }
            | Self::Write { sink, .. }
            | Self::Flush { sink, .. }
            | Self::Background { sink, .. }
            | Self::Shutdown { sink, .. }
            | Self::Task { sink, .. } => Some(sink),
            Self::Config(_) | Self::Io(_) => None,
        }
    }

    /// Drain report of a shutdown that failed after draining
    pub fn drain_report(&self) -> Option<&DrainReport> {
        match self {
            Self::Shutdown { report, .. } => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
