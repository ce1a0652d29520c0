//! Tests for the buffered accumulators

use std::io::Write;

use crate::buffered::{BufferedAccumulator, DEFAULT_BUFFER_SIZE, SizeTrackingAccumulator};
use crate::common::WriteSync;
use crate::util::MemoryWriter;

// =============================================================================
// BufferedAccumulator tests
// =============================================================================

#[test]
fn test_buffered_default_capacity() {
    let acc = BufferedAccumulator::new(MemoryWriter::new());
    assert_eq!(acc.capacity(), DEFAULT_BUFFER_SIZE);
    assert_eq!(acc.available(), DEFAULT_BUFFER_SIZE);
}

#[test]
fn test_buffered_small_writes_stay_in_memory() {
    let sink = MemoryWriter::new();
    let mut acc = BufferedAccumulator::with_capacity(sink.clone(), 64);

    acc.write_all(b"one\n").unwrap();
    acc.write_all(b"two\n").unwrap();

    assert_eq!(acc.buffered(), 8);
    assert_eq!(sink.write_count(), 0);
}

#[test]
fn test_buffered_flushes_before_overflow() {
    let sink = MemoryWriter::new();
    let mut acc = BufferedAccumulator::with_capacity(sink.clone(), 10);

    acc.write_all(b"aaaaaa\n").unwrap(); // 7 bytes
    acc.write_all(b"bbbbb\n").unwrap(); // 6 bytes, does not fit in the 3 left

    // First line went down whole; second line waits in the buffer
    assert_eq!(sink.write_sizes(), vec![7]);
    assert_eq!(acc.buffered(), 6);

    acc.flush().unwrap();
    assert_eq!(sink.write_sizes(), vec![7, 6]);
    assert_eq!(sink.contents(), b"aaaaaa\nbbbbb\n");
}

#[test]
fn test_buffered_exact_fit_is_buffered() {
    let sink = MemoryWriter::new();
    let mut acc = BufferedAccumulator::with_capacity(sink.clone(), 8);

    acc.write_all(b"12345678").unwrap();
    assert_eq!(acc.buffered(), 8);
    assert_eq!(acc.available(), 0);
    assert_eq!(sink.write_count(), 0);
}

#[test]
fn test_buffered_oversized_write_goes_direct() {
    let sink = MemoryWriter::new();
    let mut acc = BufferedAccumulator::with_capacity(sink.clone(), 8);

    acc.write_all(b"ab\n").unwrap();
    acc.write_all(b"this line is longer than eight\n").unwrap();

    // Pending bytes first, then the big line in one piece
    assert_eq!(sink.write_sizes(), vec![3, 31]);
    assert_eq!(acc.buffered(), 0);
}

#[test]
fn test_buffered_lines_never_split() {
    let sink = MemoryWriter::new();
    let mut acc = BufferedAccumulator::with_capacity(sink.clone(), 32);

    for i in 0..100 {
        acc.write_all(format!("line={i}\n").as_bytes()).unwrap();
    }
    acc.flush().unwrap();

    // Every downstream write ends on a line boundary
    let contents = sink.contents();
    let mut offset = 0;
    for size in sink.write_sizes() {
        offset += size;
        assert_eq!(contents[offset - 1], b'\n');
    }
    assert_eq!(sink.lines().len(), 100);
}

#[test]
fn test_buffered_sync_flushes_then_syncs() {
    let sink = MemoryWriter::new();
    let mut acc = BufferedAccumulator::with_capacity(sink.clone(), 64);

    acc.write_all(b"pending\n").unwrap();
    acc.sync().unwrap();

    assert_eq!(sink.contents(), b"pending\n");
    assert_eq!(sink.sync_count(), 1);
    assert_eq!(acc.buffered(), 0);
}

#[test]
fn test_buffered_sync_is_idempotent() {
    let sink = MemoryWriter::new();
    let mut acc = BufferedAccumulator::with_capacity(sink.clone(), 64);

    acc.write_all(b"x\n").unwrap();
    acc.sync().unwrap();
    acc.sync().unwrap();

    assert_eq!(sink.contents(), b"x\n");
    assert_eq!(sink.write_count(), 1);
}

#[test]
fn test_buffered_keeps_bytes_on_failed_flush() {
    let sink = MemoryWriter::new();
    let mut acc = BufferedAccumulator::with_capacity(sink.clone(), 64);

    acc.write_all(b"keep me\n").unwrap();
    sink.set_fail_writes(true);
    assert!(acc.flush().is_err());
    assert_eq!(acc.buffered(), 8);

    sink.set_fail_writes(false);
    acc.flush().unwrap();
    assert_eq!(sink.contents(), b"keep me\n");
}

#[test]
fn test_buffered_forced_flush_error_returned_from_write() {
    let sink = MemoryWriter::new();
    let mut acc = BufferedAccumulator::with_capacity(sink.clone(), 8);

    acc.write_all(b"12345\n").unwrap();
    sink.set_fail_writes(true);

    assert!(acc.write_all(b"6789\n").is_err());
}

// =============================================================================
// SizeTrackingAccumulator tests
// =============================================================================

#[test]
fn test_size_tracking_counts_bytes() {
    let sink = MemoryWriter::new();
    let mut acc =
        SizeTrackingAccumulator::new(BufferedAccumulator::with_capacity(sink.clone(), 1024), 100);

    acc.write_all(b"0123456789").unwrap();
    acc.write_all(b"0123456789").unwrap();

    assert_eq!(acc.bytes_since_flush(), 20);
    assert_eq!(sink.write_count(), 0);
}

#[test]
fn test_size_tracking_flushes_at_threshold() {
    let sink = MemoryWriter::new();
    let mut acc =
        SizeTrackingAccumulator::new(BufferedAccumulator::with_capacity(sink.clone(), 1024), 25);

    acc.write_all(b"0123456789").unwrap(); // 10
    acc.write_all(b"0123456789").unwrap(); // 20
    assert_eq!(sink.write_count(), 0);

    // 20 + 10 >= 25: flush the first 20 bytes, then count the new write alone
    acc.write_all(b"0123456789").unwrap();
    assert_eq!(sink.write_sizes(), vec![20]);
    assert_eq!(acc.bytes_since_flush(), 10);
    assert_eq!(acc.get_ref().buffered(), 10);
}

#[test]
fn test_size_tracking_threshold_is_inclusive() {
    let sink = MemoryWriter::new();
    let mut acc =
        SizeTrackingAccumulator::new(BufferedAccumulator::with_capacity(sink.clone(), 1024), 20);

    acc.write_all(b"0123456789").unwrap();
    acc.write_all(b"0123456789").unwrap(); // 10 + 10 >= 20

    assert_eq!(sink.write_sizes(), vec![10]);
    assert_eq!(acc.bytes_since_flush(), 10);
}

#[test]
fn test_size_tracking_sync_keeps_counter() {
    let sink = MemoryWriter::new();
    let mut acc =
        SizeTrackingAccumulator::new(BufferedAccumulator::with_capacity(sink.clone(), 1024), 100);

    acc.write_all(b"0123456789").unwrap();
    acc.sync().unwrap();

    assert_eq!(sink.sync_count(), 1);
    assert_eq!(acc.bytes_since_flush(), 10);
}

#[test]
fn test_size_tracking_failed_flush_restarts_counter() {
    let sink = MemoryWriter::new();
    let mut acc =
        SizeTrackingAccumulator::new(BufferedAccumulator::with_capacity(sink.clone(), 1024), 25);

    acc.write_all(b"0123456789").unwrap();
    acc.write_all(b"0123456789").unwrap();
    sink.set_fail_writes(true);

    // 20 + 10 >= 25 forces a flush that fails; the new line is rejected
    assert!(acc.write_all(b"0123456789").is_err());
    assert_eq!(acc.bytes_since_flush(), 0);
    assert_eq!(acc.get_ref().buffered(), 20);

    // Below the threshold again, so no flush is attempted
    acc.write_all(b"abc\n").unwrap();
    assert_eq!(acc.bytes_since_flush(), 4);

    sink.set_fail_writes(false);
    acc.sync().unwrap();
    assert_eq!(sink.contents(), b"01234567890123456789abc\n");
}
