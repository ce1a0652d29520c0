//! Async backpressure sink
//!
//! Decouples log producers from disk latency with a bounded queue drained
//! by one consumer task.
//!
//! ```text
//! write(&[u8]) --pooled copy--> try_send --ok--> [mpsc queue] --> consumer --+
//!       |                                                                    |
//!       +--full/closed--> synchronous write under the writer mutex <---------+
//! ```
//!
//! # Guarantees
//!
//! - A full queue never drops a line: the producer writes it itself.
//! - Lines from one producer that all go through the queue keep their order.
//!   Queued and fallback lines from different producers are byte-safe but
//!   not chronologically ordered.
//! - `sync` flushes what has reached the writer; it does not wait for the
//!   queue. `shutdown` drains the queue within a per-line grace window.
//!
//! Construction spawns two tasks and must happen inside a Tokio runtime.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::BytesMut;
use kvtab_protocol::BufferPool;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::common::{Result, SinkError, WriteSync};
use crate::util::RateLimitedLogger;

/// Default queue capacity, in lines
pub const DEFAULT_QUEUE_SIZE: usize = 10_000;

/// Default interval of the periodic flush
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Default time a single queued line may take to drain on shutdown
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Configuration for an async sink
#[derive(Debug, Clone)]
pub struct AsyncSinkConfig {
    /// Sink name used in diagnostics and errors
    pub name: String,

    /// Queue capacity in lines (default: 10,000)
    pub queue_size: usize,

    /// Periodic flush interval (default: 30s)
    pub flush_interval: Duration,

    /// Per-line drain window on shutdown (default: 100ms)
    pub drain_grace: Duration,

    /// Capacity hint for pooled queue buffers (default: 1KB)
    pub buffer_capacity: usize,
}

impl Default for AsyncSinkConfig {
    fn default() -> Self {
        Self {
            name: "async".into(),
            queue_size: DEFAULT_QUEUE_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            drain_grace: DEFAULT_DRAIN_GRACE,
            buffer_capacity: kvtab_protocol::DEFAULT_LINE_CAPACITY,
        }
    }
}

impl AsyncSinkConfig {
    /// Create config with a custom name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    #[must_use]
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.queue_size == 0 {
            return Err(SinkError::config("queue_size must be greater than zero"));
        }
        if self.flush_interval.is_zero() {
            return Err(SinkError::config("flush_interval must be greater than zero"));
        }
        Ok(())
    }
}

/// Metrics for an async sink
#[derive(Debug, Default)]
pub struct AsyncSinkMetrics {
    /// Lines accepted into the queue
    pub queued: AtomicU64,

    /// Lines written synchronously because the queue was full or closed
    pub fallback_writes: AtomicU64,

    /// Lines that reached the writer
    pub written: AtomicU64,

    /// Consumer or drain writes that failed
    pub write_errors: AtomicU64,

    /// Downstream syncs performed
    pub flushes: AtomicU64,

    /// Downstream syncs that failed
    pub flush_errors: AtomicU64,

    /// Lines written during shutdown drain
    pub drained: AtomicU64,

    /// Lines that did not reach the writer during the drain
    pub discarded: AtomicU64,
}

impl AsyncSinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            queued: AtomicU64::new(0),
            fallback_writes: AtomicU64::new(0),
            written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            flush_errors: AtomicU64::new(0),
            drained: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> AsyncSinkSnapshot {
        AsyncSinkSnapshot {
            queued: self.queued.load(Ordering::Relaxed),
            fallback_writes: self.fallback_writes.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            flush_errors: self.flush_errors.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of async sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsyncSinkSnapshot {
    pub queued: u64,
    pub fallback_writes: u64,
    pub written: u64,
    pub write_errors: u64,
    pub flushes: u64,
    pub flush_errors: u64,
    pub drained: u64,
    pub discarded: u64,
}

/// Outcome of draining the queue on shutdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Lines written during the drain
    pub drained: u64,

    /// Lines that never reached the writer: the grace window ran out or
    /// the write failed
    pub discarded: u64,
}

/// Last background failure not yet reported by `sync`
#[derive(Debug)]
struct PendingError {
    count: u64,
    last_error: String,
}

/// State shared by the handle, the consumer and the flusher
struct Shared {
    name: String,
    writer: Mutex<Box<dyn WriteSync>>,
    pool: BufferPool,
    metrics: AsyncSinkMetrics,
    pending_error: Mutex<Option<PendingError>>,
    error_logger: RateLimitedLogger,
}

impl Shared {
    /// Write one queued line and recycle its buffer
    ///
    /// Returns false if the line did not reach the writer.
    fn write_queued(&self, buf: BytesMut) -> bool {
        let result = self.writer.lock().write_all(&buf);
        self.pool.put(buf);

        match result {
            Ok(()) => {
                self.metrics.written.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                self.metrics.write_errors.fetch_add(1, Ordering::Relaxed);
                self.error_logger
                    .error(&self.name, "background write failed", &e);

                let mut pending = self.pending_error.lock();
                let pending = pending.get_or_insert(PendingError {
                    count: 0,
                    last_error: String::new(),
                });
                pending.count += 1;
                pending.last_error = e.to_string();
                false
            }
        }
    }

    /// Flush and sync the writer
    fn flush(&self) -> Result<()> {
        let result = self.writer.lock().sync();
        match result {
            Ok(()) => {
                self.metrics.flushes.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.metrics.flush_errors.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::flush(&self.name, e))
            }
        }
    }

    /// Flush, then report background failures since the last sync
    fn sync(&self) -> Result<()> {
        self.flush()?;
        match self.pending_error.lock().take() {
            Some(PendingError { count, last_error }) => Err(SinkError::Background {
                sink: self.name.clone(),
                count,
                last_error,
            }),
            None => Ok(()),
        }
    }
}

/// Bounded-queue sink with synchronous fallback
pub struct AsyncSink {
    shared: Arc<Shared>,
    sender: mpsc::Sender<BytesMut>,

    /// Stops the consumer and the flusher
    cancel: CancellationToken,

    /// Child of `cancel`; stops only the flusher
    flusher_cancel: CancellationToken,

    /// Consumer task; hands the queue back when cancelled
    consumer: Mutex<Option<JoinHandle<mpsc::Receiver<BytesMut>>>>,

    drain_grace: Duration,
}

impl AsyncSink {
    /// Start a sink writing to `writer`
    ///
    /// Spawns the consumer and the periodic flusher on the current runtime.
    pub fn spawn<W>(writer: W, config: AsyncSinkConfig) -> Result<Self>
    where
        W: WriteSync + 'static,
    {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SinkError::init(&config.name, e.to_string()))?;

        let shared = Arc::new(Shared {
            name: config.name.clone(),
            writer: Mutex::new(Box::new(writer)),
            pool: BufferPool::new(config.buffer_capacity),
            metrics: AsyncSinkMetrics::new(),
            pending_error: Mutex::new(None),
            error_logger: RateLimitedLogger::default(),
        });

        let (sender, receiver) = mpsc::channel(config.queue_size);
        let cancel = CancellationToken::new();
        let flusher_cancel = cancel.child_token();

        let consumer = runtime.spawn(run_consumer(
            Arc::clone(&shared),
            receiver,
            cancel.clone(),
        ));
        runtime.spawn(run_flusher(
            Arc::clone(&shared),
            config.flush_interval,
            flusher_cancel.clone(),
        ));

        tracing::debug!(
            sink = %config.name,
            queue_size = config.queue_size,
            flush_interval = ?config.flush_interval,
            "async sink started"
        );

        Ok(Self {
            shared,
            sender,
            cancel,
            flusher_cancel,
            consumer: Mutex::new(Some(consumer)),
            drain_grace: config.drain_grace,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    #[inline]
    pub fn metrics(&self) -> &AsyncSinkMetrics {
        &self.shared.metrics
    }

    /// Pool backing the queue buffers
    #[inline]
    pub fn pool(&self) -> &BufferPool {
        &self.shared.pool
    }

    /// Queue `data` for the consumer, or write it directly if the queue is full
    ///
    /// The caller's slice is copied; it may be reused as soon as this returns.
    /// Only a failed synchronous write is reported; queued lines report their
    /// failures through `sync`.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let mut buf = self.shared.pool.get();
        buf.extend_from_slice(data);

        match self.sender.try_send(buf) {
            Ok(()) => {
                self.shared.metrics.queued.fetch_add(1, Ordering::Relaxed);
                Ok(data.len())
            }
            Err(TrySendError::Full(buf) | TrySendError::Closed(buf)) => {
                self.shared
                    .metrics
                    .fallback_writes
                    .fetch_add(1, Ordering::Relaxed);

                let result = self.shared.writer.lock().write_all(&buf);
                self.shared.pool.put(buf);
                result.map_err(|e| SinkError::write(&self.shared.name, e))?;

                self.shared.metrics.written.fetch_add(1, Ordering::Relaxed);
                Ok(data.len())
            }
        }
    }

    /// Flush the downstream writer
    ///
    /// Lines still in the queue are not waited for. Fails if the flush fails
    /// or if any background write failed since the previous call.
    pub fn sync(&self) -> Result<()> {
        self.shared.sync()
    }

    /// Stop the tasks, drain the queue and sync
    ///
    /// Each dequeued line gets `drain_grace` to be written; once a write
    /// finishes past its deadline the remaining lines are discarded and
    /// counted. A dequeued line whose write fails counts as discarded too.
    /// If the final sync fails, the error is `SinkError::Shutdown` and still
    /// carries the drain report. Calling `shutdown` again only syncs. Writes
    /// issued after shutdown go straight to the writer.
    pub async fn shutdown(&self) -> Result<DrainReport> {
        self.cancel.cancel();

        let consumer = self.consumer.lock().take();
        let mut report = DrainReport::default();

        if let Some(consumer) = consumer {
            let mut receiver = consumer.await.map_err(|e| SinkError::Task {
                sink: self.shared.name.clone(),
                message: e.to_string(),
            })?;
            receiver.close();

            report = self.drain(&mut receiver).await;
            self.shared
                .metrics
                .drained
                .fetch_add(report.drained, Ordering::Relaxed);
            self.shared
                .metrics
                .discarded
                .fetch_add(report.discarded, Ordering::Relaxed);

            if report.discarded > 0 {
                tracing::warn!(
                    sink = %self.shared.name,
                    drained = report.drained,
                    discarded = report.discarded,
                    "discarded queued lines during drain"
                );
            } else {
                tracing::debug!(
                    sink = %self.shared.name,
                    drained = report.drained,
                    "async sink drained"
                );
            }
        }

        self.shared.sync().map_err(|e| SinkError::Shutdown {
            sink: self.shared.name.clone(),
            report,
            source: Box::new(e),
        })?;
        Ok(report)
    }

    async fn drain(&self, receiver: &mut mpsc::Receiver<BytesMut>) -> DrainReport {
        let mut report = DrainReport::default();

        loop {
            let deadline = Instant::now() + self.drain_grace;
            match tokio::time::timeout_at(deadline, receiver.recv()).await {
                Ok(Some(buf)) => {
                    if self.shared.write_queued(buf) {
                        report.drained += 1;
                    } else {
                        report.discarded += 1;
                    }
                    if Instant::now() >= deadline {
                        break;
                    }
                }
                Ok(None) | Err(_) => break,
            }
        }

        while let Ok(buf) = receiver.try_recv() {
            self.shared.pool.put(buf);
            report.discarded += 1;
        }

        report
    }
}

impl Drop for AsyncSink {
    fn drop(&mut self) {
        // The consumer drains what is left once the sender is gone
        self.flusher_cancel.cancel();
    }
}

impl std::fmt::Debug for AsyncSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSink")
            .field("name", &self.shared.name)
            .field("metrics", &self.shared.metrics.snapshot())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Consumer task: write queued lines until cancelled or every sender is gone
async fn run_consumer(
    shared: Arc<Shared>,
    mut receiver: mpsc::Receiver<BytesMut>,
    cancel: CancellationToken,
) -> mpsc::Receiver<BytesMut> {
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::debug!(sink = %shared.name, "consumer cancelled");
                break;
            }
            buf = receiver.recv() => {
                match buf {
                    Some(buf) => {
                        shared.write_queued(buf);
                    }
                    None => {
                        // Handle dropped - queue fully drained
                        if let Err(e) = shared.sync() {
                            tracing::error!(sink = %shared.name, error = %e, "final sync failed");
                        }
                        tracing::debug!(sink = %shared.name, "consumer finished");
                        break;
                    }
                }
            }
        }
    }

    receiver
}

/// Periodic flush task
async fn run_flusher(shared: Arc<Shared>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = shared.flush() {
                    shared.error_logger.error(&shared.name, "periodic flush failed", &e);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "async_sink_test.rs"]
mod async_sink_test;
