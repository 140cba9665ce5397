//! Talker engine and lifecycle coordination.
//!
//! A [`Talker`] cycles through wait / select / reserve / call / release
//! against the shared busy table, emitting a record for each step through
//! the log channel. The [`Coordinator`] owns the run: it spawns every
//! talker plus the observer, waits out the configured duration or an
//! interrupt, raises the stop flag, wakes every sleeper, and tears the run
//! down exactly once.

pub mod coordinator;
pub mod metrics;
pub mod talker;

pub use coordinator::{Coordinator, SimReport};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use talker::Talker;

use chatter_channel::ChannelError;
use thiserror::Error;

/// Fatal engine failures. Transient contention never surfaces here; it is
/// absorbed by the talker loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The log channel was torn down while a producer still needed it.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A spawned task panicked or was aborted.
    #[error("task failed: {0}")]
    TaskFailed(String),
}
