//! Best-effort delivery of debug traces to persistent storage.
mod writer;


use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;

use crate::pipeline::DebugTrace;

pub use writer::{DB_FLUSH_SIZE, TraceWriterConfig, setup_trace_writer};

/// Fire-and-forget handle for submitting traces. Submissions are spread
/// round-robin over the writer channels and never block.
#[derive(Debug)]
pub struct TraceSink {
    senders: Vec<mpsc::UnboundedSender<DebugTrace>>,
    next: AtomicUsize,
}

impl TraceSink {
    #[must_use]
    pub const fn new(senders: Vec<mpsc::UnboundedSender<DebugTrace>>) -> Self {
        Self {
            senders,
            next: AtomicUsize::new(0),
        }
    }

    /// A sink with one channel, plus the receiving end for a writer.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DebugTrace>) {
        let (trace_tx, trace_rx) = mpsc::unbounded_channel();
        (Self::new(vec![trace_tx]), trace_rx)
    }

    /// Returns `false` when no writer is listening; the trace is dropped.
    pub fn submit(&self, trace: DebugTrace) -> bool {
        if self.senders.is_empty() {
            return false;
        }
        let len = self.senders.len();
        let idx = self
            .next
            .fetch_add(1, Ordering::Relaxed)
            .checked_rem(len)
            .unwrap_or(0);
        self.senders
            .get(idx)
            .is_some_and(|sender| sender.send(trace).is_ok())
    }
}
