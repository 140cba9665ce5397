//! Run-wide engine counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by every talker, read at the end of the run.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Calls that completed their full reserve/talk/release cycle.
    pub calls_completed: AtomicU64,
    /// Reservation attempts rejected because a party was busy or the stop
    /// flag was set.
    pub reservations_failed: AtomicU64,
    /// Cycles abandoned because no distinct target was found within the
    /// attempt bound.
    pub selections_exhausted: AtomicU64,
}

impl EngineMetrics {
    pub fn record_call_completed(&self) {
        self.calls_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reservation_failed(&self) {
        self.reservations_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_selection_exhausted(&self) {
        self.selections_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls_completed: self.calls_completed.load(Ordering::Relaxed),
            reservations_failed: self.reservations_failed.load(Ordering::Relaxed),
            selections_exhausted: self.selections_exhausted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub calls_completed: u64,
    pub reservations_failed: u64,
    pub selections_exhausted: u64,
}
