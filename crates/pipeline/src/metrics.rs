//! Pipeline router metrics
//!
//! Atomic counters for tracking router activity.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the pipeline router
///
/// All methods are safe to call from multiple threads concurrently.
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Records handed to `route`
    records: AtomicU64,

    /// Records no gate accepted (never encoded)
    filtered: AtomicU64,

    /// Records dropped because a field failed to encode
    encode_errors: AtomicU64,

    /// Lines accepted by a sink
    deliveries: AtomicU64,

    /// Lines a sink rejected
    delivery_failures: AtomicU64,
}

impl RouterMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            records: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            encode_errors: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn encode_error(&self) {
        self.encode_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn delivery_success(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records: self.records.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of router metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records: u64,
    pub filtered: u64,
    pub encode_errors: u64,
    pub deliveries: u64,
    pub delivery_failures: u64,
}

impl MetricsSnapshot {
    /// Records that were encoded and offered to at least one sink
    #[inline]
    pub fn routed(&self) -> u64 {
        self.records
            .saturating_sub(self.filtered)
            .saturating_sub(self.encode_errors)
    }
}
