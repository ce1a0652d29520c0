//! Router - Encode once, deliver to every accepting sink
//!
//! The `Router` owns the encoder and the registered sinks. Each record is
//! checked against the sink gates first; only when at least one sink wants
//! it is the record encoded. The same line bytes are then written to every
//! accepting sink and the buffer goes back to the pool.

use std::mem;
use std::sync::Arc;

use kvtab_protocol::{KvTabEncoder, LogRecord, Severity};
use kvtab_sinks::DrainReport;

use crate::error::{PipelineError, Result, SinkFailure};
use crate::metrics::RouterMetrics;
use crate::sink_handle::SinkHandle;

/// Drain outcome of one sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub sink: String,
    pub report: DrainReport,
}

/// Fan-out router from records to gated sinks
///
/// # Example
///
/// ```ignore
/// let mut router = Router::new(KvTabEncoder::default());
/// router.register_sink(SinkHandle::new("primary", Gate::at_least(Severity::Info), primary));
/// router.register_sink(SinkHandle::new("secondary", Gate::errors(), secondary));
///
/// let record = LogRecord::new(Severity::Error, "REQ").with_message("upstream timeout");
/// assert_eq!(router.route(&record)?, 2);
/// ```
pub struct Router {
    encoder: KvTabEncoder,

    /// Registered sinks in registration order
    sinks: Vec<SinkHandle>,

    /// Router metrics (Arc for sharing with reporters)
    metrics: Arc<RouterMetrics>,
}

impl Router {
    /// Create a router with no sinks
    pub fn new(encoder: KvTabEncoder) -> Self {
        Self {
            encoder,
            sinks: Vec::new(),
            metrics: Arc::new(RouterMetrics::new()),
        }
    }

    /// Register a sink; lines are delivered in registration order
    pub fn register_sink(&mut self, handle: SinkHandle) {
        tracing::debug!(sink = %handle.name(), gate = ?handle.gate(), "sink registered");
        self.sinks.push(handle);
    }

    #[inline]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(SinkHandle::name).collect()
    }

    /// Whether any sink would take a record of `severity`
    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        self.sinks.iter().any(|s| s.accepts(severity))
    }

    #[inline]
    pub fn encoder(&self) -> &KvTabEncoder {
        &self.encoder
    }

    #[inline]
    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    /// Shared handle to the metrics, valid after the router is dropped
    pub fn metrics_handle(&self) -> Arc<RouterMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Encode `record` once and write it to every accepting sink
    ///
    /// Returns the number of sinks that accepted the line, 0 if no gate
    /// took the record. A failing sink does not stop delivery to the rest;
    /// all failures come back together in `PipelineError::Sinks`.
    pub fn route(&self, record: &LogRecord) -> Result<usize> {
        self.metrics.record_received();

        let severity = record.severity();
        if !self.enabled(severity) {
            self.metrics.record_filtered();
            return Ok(0);
        }

        let line = match self.encoder.encode(record) {
            Ok(line) => line,
            Err(mut e) => {
                self.encoder.recycle(mem::take(&mut e.partial));
                self.metrics.encode_error();
                return Err(PipelineError::Encode(e));
            }
        };

        let mut delivered = 0;
        let mut failures = Vec::new();

        for handle in self.sinks.iter().filter(|s| s.accepts(severity)) {
            match handle.sink().write(&line) {
                Ok(_) => {
                    self.metrics.delivery_success();
                    delivered += 1;
                }
                Err(error) => {
                    self.metrics.delivery_failure();
                    failures.push(SinkFailure {
                        sink: handle.name().to_string(),
                        error,
                    });
                }
            }
        }

        self.encoder.recycle(line);

        if failures.is_empty() {
            Ok(delivered)
        } else {
            Err(PipelineError::Sinks {
                succeeded: delivered,
                failures,
            })
        }
    }

    /// Sync every sink, reporting all failures together
    pub fn sync(&self) -> Result<()> {
        let mut succeeded = 0;
        let mut failures = Vec::new();

        for handle in &self.sinks {
            match handle.sink().sync() {
                Ok(()) => succeeded += 1,
                Err(error) => failures.push(SinkFailure {
                    sink: handle.name().to_string(),
                    error,
                }),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Sinks {
                succeeded,
                failures,
            })
        }
    }

    /// Shut every sink down in registration order
    ///
    /// Every sink is shut down even if an earlier one fails.
    pub async fn shutdown(&self) -> Result<Vec<SinkReport>> {
        let mut reports = Vec::with_capacity(self.sinks.len());
        let mut failures = Vec::new();

        for handle in &self.sinks {
            match handle.sink().shutdown().await {
                Ok(report) => reports.push(SinkReport {
                    sink: handle.name().to_string(),
                    report,
                }),
                Err(error) => failures.push(SinkFailure {
                    sink: handle.name().to_string(),
                    error,
                }),
            }
        }

        if failures.is_empty() {
            Ok(reports)
        } else {
            Err(PipelineError::Sinks {
                succeeded: reports.len(),
                failures,
            })
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("sinks", &self.sinks)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
