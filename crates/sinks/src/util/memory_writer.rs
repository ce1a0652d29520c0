//! In-memory raw sink
//!
//! Clones share the same storage, so one handle can be moved into a pipeline
//! while another inspects what arrived. Writes and syncs can be made to fail
//! or to stall, which is how backpressure and drain behavior are exercised.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::common::WriteSync;

#[derive(Debug, Default)]
struct MemoryState {
    data: Vec<u8>,
    write_sizes: Vec<usize>,
    syncs: u64,
    fail_writes: bool,
    fail_syncs: bool,
    write_delay: Option<Duration>,
}

/// Shared in-memory `WriteSync`
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every write
    #[must_use]
    pub fn with_write_delay(self, delay: Duration) -> Self {
        self.state.lock().write_delay = Some(delay);
        self
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Make subsequent syncs fail
    pub fn set_fail_syncs(&self, fail: bool) {
        self.state.lock().fail_syncs = fail;
    }

    /// Copy of everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }

    /// Written bytes split into lines, line endings removed
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.state.lock().data)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Size of every successful write, in order
    pub fn write_sizes(&self) -> Vec<usize> {
        self.state.lock().write_sizes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().write_sizes.len()
    }

    pub fn sync_count(&self) -> u64 {
        self.state.lock().syncs
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let delay = self.state.lock().write_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(io::Error::other("injected write failure"));
        }
        state.data.extend_from_slice(data);
        state.write_sizes.push(data.len());
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteSync for MemoryWriter {
    fn sync(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.fail_syncs {
            return Err(io::Error::other("injected sync failure"));
        }
        state.syncs += 1;
        Ok(())
    }
}
