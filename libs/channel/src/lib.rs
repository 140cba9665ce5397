//! Log Channel: ordered text records from many producers to one observer.
//!
//! Two interchangeable transports sit behind one `(LogWriter, LogReader)`
//! pair, selected by [`ChannelConfig`]:
//!
//! - **Queue**: a bounded `tokio::sync::mpsc` channel. A full queue
//!   back-pressures the producer (the emit awaits) rather than dropping.
//!   The stream ends when the [`STOP_SENTINEL`] record arrives.
//! - **Ring**: a shared circular buffer with a monotonic sequence counter,
//!   guarded by its own lock (never the state lock). The reader polls,
//!   drains whatever is published, and skips records it was too slow for.
//!   The stream ends once the stop flag is set and everything published has
//!   been drained, so the final burst before shutdown is never lost.
//!
//! Per-producer emission order is preserved by both transports; the ring
//! additionally yields one global order via its sequence counter.

pub mod error;
pub mod ring;

pub use error::ChannelError;
pub use ring::RingBuffer;

use chatter_state::SimState;
use chatter_types::{ChannelConfig, STOP_SENTINEL};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long the ring reader sleeps when it has caught up with the writers.
pub const RING_POLL_INTERVAL: Duration = Duration::from_millis(150);

/// One consumed log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Publication index, present only on the ring transport.
    pub seq: Option<u64>,
    /// Records skipped immediately before this one because the reader fell
    /// behind a lossy transport. Always zero on the queue transport.
    pub gap: u64,
    pub line: String,
}

impl LogRecord {
    fn queued(line: String) -> Self {
        Self {
            seq: None,
            gap: 0,
            line,
        }
    }
}

/// Builds the channel for the configured transport.
///
/// `state` supplies the stop flag the ring reader needs for its termination
/// condition; the queue reader terminates on the sentinel alone.
pub fn log_channel(config: ChannelConfig, state: Arc<SimState>) -> (LogWriter, LogReader) {
    match config {
        ChannelConfig::Queue { capacity } => {
            let (tx, rx) = mpsc::channel(capacity);
            (
                LogWriter {
                    inner: WriterInner::Queue(tx),
                },
                LogReader {
                    inner: ReaderInner::Queue(rx),
                },
            )
        }
        ChannelConfig::Ring { capacity } => {
            let buffer = RingBuffer::new(capacity);
            (
                LogWriter {
                    inner: WriterInner::Ring(Arc::clone(&buffer)),
                },
                LogReader {
                    inner: ReaderInner::Ring {
                        buffer,
                        state,
                        last_seen: 0,
                        pending: VecDeque::new(),
                        skipped: 0,
                    },
                },
            )
        }
    }
}

/// Producer handle. Cloned into every talker; all clones emit concurrently.
#[derive(Debug, Clone)]
pub struct LogWriter {
    inner: WriterInner,
}

#[derive(Debug, Clone)]
enum WriterInner {
    Queue(mpsc::Sender<String>),
    Ring(Arc<RingBuffer>),
}

impl LogWriter {
    /// Emits one record.
    ///
    /// Queue transport: awaits while the queue is full; errors only when
    /// the reader is gone. Ring transport: publishes immediately,
    /// overwriting the oldest slot when the buffer has lapped.
    pub async fn emit(&self, line: impl Into<String>) -> Result<(), ChannelError> {
        match &self.inner {
            WriterInner::Queue(tx) => tx
                .send(line.into())
                .await
                .map_err(|_| ChannelError::Closed),
            WriterInner::Ring(buffer) => {
                buffer.publish(line.into());
                Ok(())
            }
        }
    }

    /// Emits the terminal sentinel record.
    pub async fn emit_sentinel(&self) -> Result<(), ChannelError> {
        self.emit(STOP_SENTINEL).await
    }
}

/// Consumer handle held by the observer.
#[derive(Debug)]
pub struct LogReader {
    inner: ReaderInner,
}

#[derive(Debug)]
enum ReaderInner {
    Queue(mpsc::Receiver<String>),
    Ring {
        buffer: Arc<RingBuffer>,
        state: Arc<SimState>,
        last_seen: u64,
        pending: VecDeque<LogRecord>,
        skipped: u64,
    },
}

impl LogReader {
    /// Receives the next record, or `None` at end of stream.
    ///
    /// Queue transport: blocks on an empty queue; ends on the sentinel or
    /// when every writer has been dropped. Ring transport: drains published
    /// records, sleeping [`RING_POLL_INTERVAL`] when caught up; ends on the
    /// sentinel, or once the stop flag is set and `last_seen` has reached
    /// the publication counter.
    pub async fn next(&mut self) -> Option<LogRecord> {
        match &mut self.inner {
            ReaderInner::Queue(rx) => {
                let line = rx.recv().await?;
                if line == STOP_SENTINEL {
                    return None;
                }
                Some(LogRecord::queued(line))
            }
            ReaderInner::Ring {
                buffer,
                state,
                last_seen,
                pending,
                skipped,
            } => loop {
                if pending.is_empty() {
                    *skipped += buffer.drain_into(last_seen, pending);
                }
                if let Some(record) = pending.pop_front() {
                    if record.line == STOP_SENTINEL {
                        return None;
                    }
                    return Some(record);
                }
                // Drained and nothing new: only now is stop-and-drained a
                // terminal condition, so pre-shutdown records are kept.
                if state.stop_requested() && *last_seen >= buffer.sequence() {
                    return None;
                }
                tokio::time::sleep(RING_POLL_INTERVAL).await;
            },
        }
    }

    /// Running count of records this reader skipped on a lossy transport.
    pub fn skipped(&self) -> u64 {
        match &self.inner {
            ReaderInner::Queue(_) => 0,
            ReaderInner::Ring { skipped, .. } => *skipped,
        }
    }
}
