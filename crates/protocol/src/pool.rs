//! Lock-free buffer pool for line encoding and queue transport
//!
//! Hands out `BytesMut` buffers so the hot path does not allocate per log
//! call. `get` and `put` are both explicit: a buffer is owned by exactly one
//! holder until it is handed back with `put`.
//!
//! The free list is unbounded. Every returned buffer is kept, so the pool
//! grows to the peak number of buffers in flight and stays there.
//!
//! # Example
//!
//! ```
//! use kvtab_protocol::BufferPool;
//!
//! let pool = BufferPool::new(1024);
//!
//! let mut buf = pool.get();
//! buf.extend_from_slice(b"ts=01-02T15:04:05.000\n");
//!
//! // After the write completes - hand it back
//! pool.put(buf);
//! assert_eq!(pool.metrics().snapshot().outstanding, 0);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use crossbeam::queue::SegQueue;

/// Lock-free pool of reusable `BytesMut` buffers
pub struct BufferPool {
    /// Free list of cleared buffers
    queue: SegQueue<BytesMut>,

    /// Capacity hint for freshly allocated buffers
    buffer_capacity: usize,

    metrics: BufferPoolMetrics,
}

/// Counters for buffer pool monitoring
///
/// `outstanding` is the number of buffers handed out and not yet returned;
/// `high_water` is the largest value `outstanding` ever reached. A buffer
/// that is never returned shows up as a non-zero `outstanding` once all
/// holders are done.
#[derive(Debug, Default)]
pub struct BufferPoolMetrics {
    /// Buffers served from the free list
    pub hits: AtomicU64,

    /// Buffers allocated because the free list was empty
    pub misses: AtomicU64,

    /// Buffers handed back
    pub returns: AtomicU64,

    /// Buffers currently handed out
    pub outstanding: AtomicU64,

    /// Peak of `outstanding`
    pub high_water: AtomicU64,
}

impl BufferPoolMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            outstanding: AtomicU64::new(0),
            high_water: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_checkout(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        let now = self.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
        self.high_water.fetch_max(now, Ordering::AcqRel);
    }

    #[inline]
    fn record_return(&self) {
        self.returns.fetch_add(1, Ordering::Relaxed);
        // Saturate instead of wrapping if a foreign buffer is put
        let _ = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(1))
            });
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            outstanding: self.outstanding.load(Ordering::Acquire),
            high_water: self.high_water.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time snapshot of buffer pool metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub outstanding: u64,
    pub high_water: u64,
}

impl PoolSnapshot {
    /// Fraction of `get` calls served from the free list (1.0 when idle)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl BufferPool {
    /// Create an empty pool; buffers are allocated on first use
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            queue: SegQueue::new(),
            buffer_capacity,
            metrics: BufferPoolMetrics::new(),
        }
    }

    /// Create a pool with `count` buffers allocated up front
    pub fn with_preallocated(count: usize, buffer_capacity: usize) -> Self {
        let pool = Self::new(buffer_capacity);
        for _ in 0..count {
            pool.queue.push(BytesMut::with_capacity(buffer_capacity));
        }
        pool
    }

    /// Get an empty buffer, reused when one is free
    #[inline]
    pub fn get(&self) -> BytesMut {
        match self.queue.pop() {
            Some(buf) => {
                self.metrics.record_checkout(true);
                buf
            }
            None => {
                self.metrics.record_checkout(false);
                BytesMut::with_capacity(self.buffer_capacity)
            }
        }
    }

    /// Hand a buffer back; it is cleared before it is reused
    #[inline]
    pub fn put(&self, mut buf: BytesMut) {
        buf.clear();
        self.queue.push(buf);
        self.metrics.record_return();
    }

    /// Number of free buffers
    #[inline]
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    /// Capacity hint for new buffers
    #[inline]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    #[inline]
    pub fn metrics(&self) -> &BufferPoolMetrics {
        &self.metrics
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(crate::DEFAULT_LINE_CAPACITY)
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("available", &self.available())
            .field("buffer_capacity", &self.buffer_capacity)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
