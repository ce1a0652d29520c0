//! Rate-limited error logging
//!
//! A failing disk produces one error per log line. This logger emits at most
//! one diagnostic per key and interval and reports how many were swallowed
//! in between. Keys are usually sink names, so a failing error sink does not
//! hide a failing primary sink.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use kvtab_sinks::RateLimitedLogger;
//!
//! let logger = RateLimitedLogger::new(Duration::from_secs(10));
//! let err = std::io::Error::other("disk full");
//!
//! assert!(logger.error("primary", "write failed", &err));
//! assert!(!logger.error("primary", "write failed", &err));
//! assert!(logger.error("error", "write failed", &err));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between diagnostics for one key
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct KeyState {
    last_logged: Option<Instant>,
    suppressed: u64,
}

/// Per-key throttled `tracing::error!`
#[derive(Debug)]
pub struct RateLimitedLogger {
    min_interval: Duration,
    keys: Mutex<HashMap<String, KeyState>>,
    total_errors: AtomicU64,
}

impl RateLimitedLogger {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            keys: Mutex::new(HashMap::new()),
            total_errors: AtomicU64::new(0),
        }
    }

    /// Record an error for `key`, logging it unless one was logged recently
    ///
    /// Returns true if the error was logged, false if it was suppressed.
    pub fn error(&self, key: &str, message: &str, error: &dyn fmt::Display) -> bool {
        let total = self.total_errors.fetch_add(1, Ordering::Relaxed) + 1;

        let suppressed = {
            let mut keys = self.keys.lock();
            let state = keys.entry(key.to_owned()).or_default();
            let now = Instant::now();

            match state.last_logged {
                Some(last) if now.duration_since(last) < self.min_interval => {
                    state.suppressed += 1;
                    return false;
                }
                _ => {
                    state.last_logged = Some(now);
                    std::mem::take(&mut state.suppressed)
                }
            }
        };

        if suppressed > 0 {
            tracing::error!(
                sink = %key,
                error = %error,
                suppressed_count = suppressed,
                total_errors = total,
                "{message} (rate-limited)"
            );
        } else {
            tracing::error!(sink = %key, error = %error, total_errors = total, "{message}");
        }
        true
    }

    /// Errors swallowed for `key` since it was last logged
    pub fn suppressed_count(&self, key: &str) -> u64 {
        self.keys.lock().get(key).map_or(0, |state| state.suppressed)
    }

    /// Errors recorded across all keys
    pub fn total_error_count(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}
