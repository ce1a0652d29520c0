//! Buffered accumulators
//!
//! `BufferedAccumulator` batches small writes in memory in front of a raw
//! sink. Unlike `std::io::BufWriter` it never lets one write straddle two
//! downstream writes: when a line does not fit in the free space, the
//! buffer is flushed first and the line starts a fresh buffer. A line larger
//! than the whole buffer goes downstream in a single `write_all`.
//!
//! `SizeTrackingAccumulator` wraps a `BufferedAccumulator` and counts the
//! bytes accepted since its last forced flush. Once the next write would
//! reach the configured threshold it flushes first, so the downstream sees
//! the boundary at a line edge and can rotate there. The counter restarts
//! at every forced flush attempt, failed or not, so a failing flush is not
//! retried on every following write.

use std::io::{self, Write};

use crate::common::WriteSync;

/// Default accumulator capacity (256KB)
pub const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;

/// In-memory accumulator that keeps each line in one downstream write
#[derive(Debug)]
pub struct BufferedAccumulator<W> {
    inner: W,
    buf: Vec<u8>,
    capacity: usize,
}

impl<W: WriteSync> BufferedAccumulator<W> {
    /// Wrap `inner` with the default 256KB buffer
    pub fn new(inner: W) -> Self {
        Self::with_capacity(inner, DEFAULT_BUFFER_SIZE)
    }

    /// Wrap `inner` with a buffer of `capacity` bytes (at least one)
    pub fn with_capacity(inner: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Bytes accumulated and not yet written downstream
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Free space before a flush is needed
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity - self.buf.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Write accumulated bytes downstream
    ///
    /// Bytes the downstream did not accept stay buffered and are retried by
    /// the next flush.
    fn flush_buf(&mut self) -> io::Result<()> {
        let mut written = 0;
        let result = loop {
            if written >= self.buf.len() {
                break Ok(());
            }
            match self.inner.write(&self.buf[written..]) {
                Ok(0) => {
                    break Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "downstream accepted no bytes",
                    ));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };
        self.buf.drain(..written);
        result
    }
}

impl<W: WriteSync> Write for BufferedAccumulator<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.len() > self.available() && !self.buf.is_empty() {
            self.flush_buf()?;
        }

        if data.len() > self.capacity {
            self.inner.write_all(data)?;
        } else {
            self.buf.extend_from_slice(data);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buf()?;
        self.inner.flush()
    }
}

impl<W: WriteSync> WriteSync for BufferedAccumulator<W> {
    fn sync(&mut self) -> io::Result<()> {
        self.flush_buf()?;
        self.inner.sync()
    }
}

/// Accumulator that forces a flush at a byte threshold
#[derive(Debug)]
pub struct SizeTrackingAccumulator<W> {
    inner: BufferedAccumulator<W>,
    written: u64,
    max_bytes: u64,
}

impl<W: WriteSync> SizeTrackingAccumulator<W> {
    /// Track writes through `inner`, flushing whenever `max_bytes` is reached
    pub fn new(inner: BufferedAccumulator<W>, max_bytes: u64) -> Self {
        Self {
            inner,
            written: 0,
            max_bytes,
        }
    }

    /// Bytes accepted since the last forced flush attempt
    #[inline]
    pub fn bytes_since_flush(&self) -> u64 {
        self.written
    }

    #[inline]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn get_ref(&self) -> &BufferedAccumulator<W> {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut BufferedAccumulator<W> {
        &mut self.inner
    }
}

impl<W: WriteSync> Write for SizeTrackingAccumulator<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        // The counter restarts even if the forced flush fails; the bytes stay
        // buffered for the next flush or sync.
        if self.written + data.len() as u64 >= self.max_bytes {
            self.written = 0;
            self.inner.flush()?;
        }

        let n = self.inner.write(data)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: WriteSync> WriteSync for SizeTrackingAccumulator<W> {
    fn sync(&mut self) -> io::Result<()> {
        self.inner.sync()
    }
}

#[cfg(test)]
#[path = "buffered_test.rs"]
mod buffered_test;
