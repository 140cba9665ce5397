//! Circular log buffer with a monotonic sequence counter.
//!
//! Writers publish under a dedicated lock, distinct from the state lock:
//! the slot at `seq % capacity` is filled and only then is `seq` advanced,
//! both inside one critical section, so a reader can never observe a torn
//! write. Readers keep a private `last_seen` cursor and drain whatever has
//! been published since; a reader that falls more than `capacity` behind
//! skips the overwritten records and reports the gap.

use crate::LogRecord;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

/// Fixed-size circular buffer of log lines plus a strictly increasing
/// publication counter.
#[derive(Debug)]
pub struct RingBuffer {
    capacity: u64,
    inner: Mutex<RingInner>,
}

#[derive(Debug)]
struct RingInner {
    slots: Vec<String>,
    seq: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity: capacity as u64,
            inner: Mutex::new(RingInner {
                slots: vec![String::new(); capacity],
                seq: 0,
            }),
        })
    }

    /// Writes `line` into the next slot and publishes it by advancing the
    /// sequence counter. Never blocks on a slow reader: the oldest record
    /// is overwritten once the counter laps the capacity.
    pub fn publish(&self, line: String) {
        let mut inner = self.inner.lock();
        let index = (inner.seq % self.capacity) as usize;
        inner.slots[index] = line;
        inner.seq += 1;
    }

    /// Number of records published so far.
    pub fn sequence(&self) -> u64 {
        self.inner.lock().seq
    }

    /// Drains every record published since `last_seen` into `pending`,
    /// advancing the cursor. Returns the number of records skipped because
    /// the reader had fallen behind by more than the capacity.
    ///
    /// The slot index is recomputed from the cursor on every iteration;
    /// records come out in publication order, never duplicated.
    pub fn drain_into(&self, last_seen: &mut u64, pending: &mut VecDeque<LogRecord>) -> u64 {
        let inner = self.inner.lock();
        let mut skipped = 0;
        if inner.seq - *last_seen > self.capacity {
            skipped = inner.seq - self.capacity - *last_seen;
            warn!(skipped, "ring reader fell behind, records overwritten");
            *last_seen = inner.seq - self.capacity;
        }
        let mut gap = skipped;
        while *last_seen < inner.seq {
            let index = (*last_seen % self.capacity) as usize;
            pending.push_back(LogRecord {
                seq: Some(*last_seen),
                gap,
                line: inner.slots[index].clone(),
            });
            gap = 0;
            *last_seen += 1;
        }
        skipped
    }
}
