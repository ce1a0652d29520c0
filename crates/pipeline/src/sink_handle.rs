//! Sink handle for pipeline delivery
//!
//! `SinkHandle` pairs a line sink with its name and severity gate so the
//! router can deliver lines without knowing the concrete sink type.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use kvtab_sinks::{AsyncSink, DrainReport};

use crate::gate::Gate;

/// Destination for encoded lines
///
/// Implemented by `AsyncSink`. Tests and embedders can plug in their own.
#[async_trait]
pub trait LineSink: Send + Sync {
    /// Accept one complete line
    fn write(&self, line: &[u8]) -> kvtab_sinks::Result<usize>;

    /// Flush what has been accepted so far
    fn sync(&self) -> kvtab_sinks::Result<()>;

    /// Stop accepting queued work and drain
    async fn shutdown(&self) -> kvtab_sinks::Result<DrainReport>;
}

#[async_trait]
impl LineSink for AsyncSink {
    #[inline]
    fn write(&self, line: &[u8]) -> kvtab_sinks::Result<usize> {
        AsyncSink::write(self, line)
    }

    #[inline]
    fn sync(&self) -> kvtab_sinks::Result<()> {
        AsyncSink::sync(self)
    }

    async fn shutdown(&self) -> kvtab_sinks::Result<DrainReport> {
        AsyncSink::shutdown(self).await
    }
}

/// Named, gated sink registered with a router
#[derive(Clone)]
pub struct SinkHandle {
    /// Human-readable name for errors and diagnostics
    name: String,

    gate: Gate,

    sink: Arc<dyn LineSink>,
}

impl SinkHandle {
    /// Create a new sink handle
    #[inline]
    pub fn new(name: impl Into<String>, gate: Gate, sink: Arc<dyn LineSink>) -> Self {
        Self {
            name: name.into(),
            gate,
            sink,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Whether this sink takes records of `severity`
    #[inline]
    pub fn accepts(&self, severity: kvtab_protocol::Severity) -> bool {
        self.gate.enabled(severity)
    }

    #[inline]
    pub fn sink(&self) -> &Arc<dyn LineSink> {
        &self.sink
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkHandle")
            .field("name", &self.name)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
