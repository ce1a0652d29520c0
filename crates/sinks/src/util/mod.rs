//! Sink utilities
//!
//! - **memory_writer**: Shared in-memory raw sink with failure injection
//! - **rate_limited_logger**: Per-sink throttling of repeated error diagnostics

pub mod memory_writer;
pub mod rate_limited_logger;

pub use memory_writer::MemoryWriter;
pub use rate_limited_logger::{DEFAULT_LOG_INTERVAL, RateLimitedLogger};
