//! Tests for AsyncSink
//!
//! `#[tokio::test]` runs on a current-thread runtime, so the consumer task
//! makes no progress while the test body runs synchronous writes. That makes
//! queue occupancy deterministic up to the first `.await`.

use std::time::Duration;

use crate::async_sink::{AsyncSink, AsyncSinkConfig, DrainReport};
use crate::common::SinkError;
use crate::util::MemoryWriter;

fn config(queue_size: usize) -> AsyncSinkConfig {
    AsyncSinkConfig::default()
        .with_name("test")
        .with_queue_size(queue_size)
}

/// Poll until `cond` holds, yielding to the consumer between checks
async fn wait_for(cond: impl Fn() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached");
}

// =============================================================================
// Write path tests
// =============================================================================

#[tokio::test]
async fn test_write_is_queued_then_consumed() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();

    sink.write(b"hello\n").unwrap();
    assert_eq!(writer.write_count(), 0);

    wait_for(|| writer.write_count() == 1).await;
    assert_eq!(writer.contents(), b"hello\n");

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.queued, 1);
    assert_eq!(snapshot.written, 1);
    assert_eq!(snapshot.fallback_writes, 0);
}

#[tokio::test]
async fn test_full_queue_falls_back_to_sync_write() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(4)).unwrap();

    for i in 0..5 {
        sink.write(format!("line{i}\n").as_bytes()).unwrap();
    }

    // Consumer has not run yet: only the overflow line reached the writer
    assert_eq!(writer.lines(), vec!["line4"]);
    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.queued, 4);
    assert_eq!(snapshot.fallback_writes, 1);

    let report = sink.shutdown().await.unwrap();
    assert_eq!(
        report,
        DrainReport {
            drained: 4,
            discarded: 0
        }
    );

    // Every line exactly once
    let mut lines = writer.lines();
    lines.sort();
    assert_eq!(lines, vec!["line0", "line1", "line2", "line3", "line4"]);
    assert_eq!(sink.pool().metrics().snapshot().outstanding, 0);
}

#[tokio::test]
async fn test_single_producer_fifo() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(1000)).unwrap();

    for i in 0..200 {
        sink.write(format!("seq={i}\n").as_bytes()).unwrap();
        if i % 50 == 0 {
            tokio::task::yield_now().await;
        }
    }
    sink.shutdown().await.unwrap();

    let expected: Vec<String> = (0..200).map(|i| format!("seq={i}")).collect();
    assert_eq!(writer.lines(), expected);
}

#[tokio::test]
async fn test_caller_buffer_reusable_after_write() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();

    let mut line = b"first\n".to_vec();
    sink.write(&line).unwrap();
    line.clear();
    line.extend_from_slice(b"second\n");
    sink.write(&line).unwrap();

    sink.shutdown().await.unwrap();
    assert_eq!(writer.contents(), b"first\nsecond\n");
}

#[tokio::test]
async fn test_empty_write_is_noop() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();

    assert_eq!(sink.write(b"").unwrap(), 0);
    assert_eq!(sink.metrics().snapshot().queued, 0);
}

#[tokio::test]
async fn test_fallback_write_error_is_returned() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(1)).unwrap();
    writer.set_fail_writes(true);

    assert!(sink.write(b"queued\n").is_ok());
    let err = sink.write(b"fallback\n").unwrap_err();
    assert!(matches!(err, SinkError::Write { ref sink, .. } if sink == "test"));
}

// =============================================================================
// Sync tests
// =============================================================================

#[tokio::test]
async fn test_sync_is_idempotent() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();

    sink.write(b"a\n").unwrap();
    wait_for(|| writer.write_count() == 1).await;

    sink.sync().unwrap();
    sink.sync().unwrap();

    assert_eq!(writer.contents(), b"a\n");
    assert_eq!(writer.sync_count(), 2);
}

#[tokio::test]
async fn test_sync_does_not_wait_for_queue() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();

    sink.write(b"later\n").unwrap();
    sink.sync().unwrap();

    assert!(writer.contents().is_empty());
    assert_eq!(writer.sync_count(), 1);
}

#[tokio::test]
async fn test_background_error_surfaces_on_next_sync() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();
    writer.set_fail_writes(true);

    sink.write(b"lost\n").unwrap();
    wait_for(|| sink.metrics().snapshot().write_errors == 1).await;

    let err = sink.sync().unwrap_err();
    assert!(matches!(err, SinkError::Background { count: 1, .. }));

    // Reported once
    sink.sync().unwrap();
}

#[tokio::test]
async fn test_sync_failure_is_returned() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();
    writer.set_fail_syncs(true);

    assert!(matches!(sink.sync(), Err(SinkError::Flush { .. })));
    assert_eq!(sink.metrics().snapshot().flush_errors, 1);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_flush() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(
        writer.clone(),
        config(16).with_flush_interval(Duration::from_secs(1)),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert!(writer.sync_count() >= 3);
    assert!(sink.metrics().snapshot().flushes >= 3);
}

// =============================================================================
// Shutdown tests
// =============================================================================

#[tokio::test]
async fn test_shutdown_discards_after_grace() {
    let writer = MemoryWriter::new().with_write_delay(Duration::from_millis(50));
    let sink = AsyncSink::spawn(
        writer.clone(),
        config(100).with_drain_grace(Duration::from_millis(20)),
    )
    .unwrap();

    for i in 0..5 {
        sink.write(format!("line{i}\n").as_bytes()).unwrap();
    }

    // The first drained write overruns its 20ms window; the rest are dropped
    let report = sink.shutdown().await.unwrap();
    assert_eq!(
        report,
        DrainReport {
            drained: 1,
            discarded: 4
        }
    );
    assert_eq!(writer.lines(), vec!["line0"]);

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.drained, 1);
    assert_eq!(snapshot.discarded, 4);
    assert_eq!(sink.pool().metrics().snapshot().outstanding, 0);
}

#[tokio::test]
async fn test_shutdown_with_failing_writer_keeps_report() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();

    for i in 0..5 {
        sink.write(format!("line{i}\n").as_bytes()).unwrap();
    }
    writer.set_fail_writes(true);

    let err = sink.shutdown().await.unwrap_err();
    let expected = DrainReport {
        drained: 0,
        discarded: 5,
    };
    assert_eq!(err.drain_report(), Some(&expected));
    assert_eq!(err.sink(), Some("test"));
    match err {
        SinkError::Shutdown { report, source, .. } => {
            assert_eq!(report, expected);
            assert!(matches!(*source, SinkError::Background { count: 5, .. }));
        }
        other => panic!("expected Shutdown, got {other:?}"),
    }

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.written, 0);
    assert_eq!(snapshot.drained, 0);
    assert_eq!(snapshot.discarded, 5);
    assert_eq!(snapshot.write_errors, 5);
    assert!(writer.contents().is_empty());
}

#[tokio::test]
async fn test_shutdown_twice() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();

    sink.write(b"x\n").unwrap();
    assert_eq!(sink.shutdown().await.unwrap().drained, 1);
    assert_eq!(sink.shutdown().await.unwrap(), DrainReport::default());
    assert_eq!(writer.sync_count(), 2);
}

#[tokio::test]
async fn test_write_after_shutdown_goes_direct() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();
    sink.shutdown().await.unwrap();

    sink.write(b"late\n").unwrap();

    assert_eq!(writer.contents(), b"late\n");
    assert_eq!(sink.metrics().snapshot().fallback_writes, 1);
}

#[tokio::test]
async fn test_drop_drains_in_background() {
    let writer = MemoryWriter::new();
    let sink = AsyncSink::spawn(writer.clone(), config(16)).unwrap();

    for i in 0..3 {
        sink.write(format!("line{i}\n").as_bytes()).unwrap();
    }
    drop(sink);

    wait_for(|| writer.write_count() == 3 && writer.sync_count() >= 1).await;
}

// =============================================================================
// Construction tests
// =============================================================================

#[test]
fn test_spawn_outside_runtime_fails() {
    let err = AsyncSink::spawn(MemoryWriter::new(), config(16)).unwrap_err();
    assert!(matches!(err, SinkError::Init { .. }));
}

#[test]
fn test_zero_queue_rejected() {
    let err = AsyncSink::spawn(MemoryWriter::new(), config(0)).unwrap_err();
    assert!(matches!(err, SinkError::Config(_)));
}

#[test]
fn test_zero_flush_interval_rejected() {
    let err = AsyncSink::spawn(
        MemoryWriter::new(),
        config(16).with_flush_interval(Duration::ZERO),
    )
    .unwrap_err();
    assert!(matches!(err, SinkError::Config(_)));
}

#[test]
fn test_default_config() {
    let config = AsyncSinkConfig::default();
    assert_eq!(config.queue_size, 10_000);
    assert_eq!(config.flush_interval, Duration::from_secs(30));
    assert_eq!(config.drain_grace, Duration::from_millis(100));
}
