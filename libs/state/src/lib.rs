//! Shared State Store for the chatter simulation.
//!
//! One `SimState` handle is shared by every talker, the observer, and the
//! lifecycle coordinator. The busy table and the stop flag live behind a
//! single mutex; callers only ever see whole reservations or whole releases,
//! never a half-applied pair.
//!
//! # Lock discipline
//!
//! All reads and writes of the busy table and the stop flag go through this
//! one lock. Critical sections are a handful of loads and stores, so every
//! waiter is admitted promptly. No caller ever holds this lock and the log
//! channel's lock at the same time.

use chatter_types::TalkerId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared busy-state table, stop flag, and identity counter.
#[derive(Debug)]
pub struct SimState {
    total: usize,
    inner: Mutex<StateInner>,
    next_id: AtomicU32,
}

#[derive(Debug)]
struct StateInner {
    busy: Vec<bool>,
    stop: bool,
}

impl SimState {
    /// Creates the store for a fixed number of talkers. The count never
    /// changes for the lifetime of the simulation.
    pub fn new(total: usize) -> Arc<Self> {
        Arc::new(Self {
            total,
            inner: Mutex::new(StateInner {
                busy: vec![false; total],
                stop: false,
            }),
            next_id: AtomicU32::new(0),
        })
    }

    /// Number of talkers in the simulation.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Hands out the next talker identity, wrapping modulo the talker count.
    pub fn assign_id(&self) -> TalkerId {
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        TalkerId::new(raw % self.total as u32)
    }

    /// Attempts to mark `caller` and `callee` busy together.
    ///
    /// Succeeds only when the two identities are distinct, neither is
    /// currently busy, and no stop has been requested. On failure nothing
    /// is modified; the caller simply retries on its next cycle.
    pub fn reserve(&self, caller: TalkerId, callee: TalkerId) -> bool {
        let mut inner = self.inner.lock();
        if inner.stop || caller == callee {
            return false;
        }
        if inner.busy[caller.index()] || inner.busy[callee.index()] {
            return false;
        }
        inner.busy[caller.index()] = true;
        inner.busy[callee.index()] = true;
        true
    }

    /// Clears both busy flags unconditionally.
    pub fn release(&self, caller: TalkerId, callee: TalkerId) {
        let mut inner = self.inner.lock();
        inner.busy[caller.index()] = false;
        inner.busy[callee.index()] = false;
    }

    /// Raises the stop flag. Safe to call any number of times from any task;
    /// the flag never reverts.
    pub fn request_stop(&self) {
        let mut inner = self.inner.lock();
        if !inner.stop {
            inner.stop = true;
            debug!("stop flag raised");
        }
    }

    /// Poll-point accessor for the stop flag.
    pub fn stop_requested(&self) -> bool {
        self.inner.lock().stop
    }

    /// Whether a talker currently holds a reservation.
    pub fn is_busy(&self, id: TalkerId) -> bool {
        self.inner.lock().busy[id.index()]
    }
}
