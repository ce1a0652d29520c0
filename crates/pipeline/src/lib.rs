//! kvtab - Pipeline
//!
//! Encodes each record once and hands the line to every sink whose severity
//! gate accepts it.
//!
//! # Architecture
//!
//! ```text
//!                                              ┌──→ Gate(>= threshold) ──→ AsyncSink ──→ app.log
//! Logger::emit ──→ LogRecord ──→ Router ──→ encode once
//!                                              └──→ Gate(>= Error) ─────→ AsyncSink ──→ error-app.log
//! ```
//!
//! # Key Design
//!
//! - **Encode once**: one pooled line is shared by every accepting sink
//! - **Skip early**: records no gate accepts are never encoded
//! - **Isolated sinks**: a failing sink never stops delivery to the others;
//!   every failure is collected into one error
//! - **Explicit handle**: `Logger` is owned by the caller, there is no global
//!
//! # Example
//!
//! ```ignore
//! use kvtab_config::LogConfig;
//! use kvtab_pipeline::Logger;
//! use kvtab_protocol::Severity;
//!
//! let logger = Logger::from_config(&LogConfig::default())?;
//! logger.log(Severity::Info, "INIT", "config loaded");
//! logger.shutdown().await?;
//! ```

mod error;
mod gate;
mod logger;
mod metrics;
mod router;
mod sink_handle;

pub use error::{PipelineError, Result, SinkFailure};
pub use gate::Gate;
pub use logger::{Logger, PRIMARY_SINK, SECONDARY_SINK};
pub use metrics::{MetricsSnapshot, RouterMetrics};
pub use router::{Router, SinkReport};
pub use sink_handle::{LineSink, SinkHandle};

// Re-export key types from dependencies for convenience
pub use kvtab_protocol::{Field, LogRecord, Severity};
pub use kvtab_sinks::DrainReport;

#[cfg(test)]
mod logger_test;
