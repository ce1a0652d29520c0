//! kvtab - Sinks
//!
//! Everything between an encoded line and the bytes on disk.
//!
//! # Architecture
//!
//! ```text
//! [Router] --&[u8]--> [AsyncSink] --BytesMut--> [Consumer Task]
//!                          |                          |
//!                          +--- queue full ---------->+--> Mutex<Box<dyn WriteSync>>
//!                                                                 |
//!                                       SizeTrackingAccumulator --+
//!                                               |
//!                                       BufferedAccumulator
//!                                               |
//!                                         RotatingFile
//! ```
//!
//! Producers never block on a full queue: the line is written synchronously
//! under the downstream mutex instead. The accumulators keep each line in a
//! single downstream write so a rotation never splits it.
//!
//! # Components
//!
//! | Type | Purpose |
//! |------|---------|
//! | `WriteSync` | Raw sink contract: `io::Write` plus durable `sync` |
//! | `BufferedAccumulator` | In-memory buffer that never splits a line |
//! | `SizeTrackingAccumulator` | Flushes at the rotation threshold |
//! | `RotatingFile` | Size-rotated file with backup pruning |
//! | `AsyncSink` | Bounded queue, consumer task, periodic flush, drain |
//! | `MemoryWriter` | Shared in-memory sink for tests and tooling |

/// Size-bounded buffering in front of a raw sink
pub mod buffered;

/// Size-rotated log file
pub mod rotating_file;

/// Bounded queue with a single consumer and synchronous fallback
pub mod async_sink;

/// Shared helpers (rate-limited diagnostics, in-memory sink)
pub mod util;

/// Common types shared by all sinks (errors, raw sink contract)
mod common;

pub use async_sink::{
    AsyncSink, AsyncSinkConfig, AsyncSinkMetrics, AsyncSinkSnapshot, DEFAULT_DRAIN_GRACE,
    DEFAULT_FLUSH_INTERVAL, DEFAULT_QUEUE_SIZE, DrainReport,
};
pub use buffered::{BufferedAccumulator, DEFAULT_BUFFER_SIZE, SizeTrackingAccumulator};
pub use common::{Result, SinkError, WriteSync};
pub use rotating_file::RotatingFile;
pub use util::{MemoryWriter, RateLimitedLogger};
