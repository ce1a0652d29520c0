//! kvtab Protocol - Log records and the tab-separated key=value line format
//!
//! This crate provides the types that flow into the logging pipeline:
//! - `Severity` - The five ordered log levels and their integer/literal mappings
//! - `Field` / `Value` - Typed key/value pairs attached to a record
//! - `LogRecord` - One immutable log call, consumed once by the encoder
//! - `KvTabEncoder` - Renders a record into one `key=value` line
//! - `BufferPool` - Lock-free pool of reusable `BytesMut` buffers
//!
//! # Line Format
//!
//! ```text
//! ts=01-02T15:04:05.000\tfile=src/x.rs:10\tlogLev=[INFO]\tobj=START\tinfo=start done\tcost=3\n
//! ```
//!
//! Header tokens come first (timestamp, optional caller, severity literal),
//! followed by the origin, the message and the record's fields in call order.
//! Values are written unescaped: a value containing the separator breaks the
//! line structure.

mod encoder;
mod error;
mod field;
pub mod keys;
mod pool;
mod record;
mod severity;

pub use encoder::{
    DurationEncoder, EncoderConfig, EntryEncoder, KvTabEncoder, TimeEncoder, day_milli_time,
    seconds_duration,
};
pub use error::{EncodeError, ProtocolError};
pub use field::{Field, Reflect, Value};
pub use pool::{BufferPool, BufferPoolMetrics, PoolSnapshot};
pub use record::{Caller, LogRecord};
pub use severity::Severity;

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Default capacity hint for pooled line buffers (1KB)
pub const DEFAULT_LINE_CAPACITY: usize = 1024;
