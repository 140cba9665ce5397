//! Simulation configuration.
//!
//! All values arrive here already parsed (CLI handling lives in the
//! simulator binary); `SimConfig::validate` is the single gate the core
//! trusts before any shared resource is sized.

use crate::MAX_TALKERS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default talker count when none is given.
pub const DEFAULT_TALKERS: usize = 5;
/// Default simulation duration in simulated seconds.
pub const DEFAULT_DURATION_SECS: u64 = 25;
/// Default bounded-queue capacity, one message per log line.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
/// Default circular log buffer capacity in slots.
pub const DEFAULT_RING_CAPACITY: usize = 256;

/// Errors produced by configuration validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("talker count must be at least 2, got {0}")]
    TooFewTalkers(usize),

    #[error("talker count {count} exceeds maximum of {max}")]
    TooManyTalkers { count: usize, max: usize },

    #[error("simulation duration must be non-zero")]
    ZeroDuration,

    #[error("log channel capacity must be non-zero")]
    ZeroCapacity,
}

/// Bounded random interval ranges, in simulated seconds.
///
/// A degenerate range (`max <= min`) is legal and yields the fixed value
/// `min`; validation does not reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Idle pause between call attempts.
    pub min_pause: u64,
    pub max_pause: u64,
    /// Duration of an established call.
    pub min_talk: u64,
    pub max_talk: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            min_pause: 1,
            max_pause: 3,
            min_talk: 1,
            max_talk: 4,
        }
    }
}

/// Which log transport carries records from talkers to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum ChannelConfig {
    /// Bounded message-passing queue; a full queue back-pressures producers.
    Queue { capacity: usize },
    /// Shared circular buffer with a monotonic sequence counter; slow
    /// readers skip overwritten records.
    Ring { capacity: usize },
}

impl ChannelConfig {
    pub fn queue() -> Self {
        Self::Queue {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn ring() -> Self {
        Self::Ring {
            capacity: DEFAULT_RING_CAPACITY,
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            Self::Queue { capacity } | Self::Ring { capacity } => *capacity,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::queue()
    }
}

/// Full simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of talker actors.
    pub talkers: usize,
    /// Wall-clock duration of the run, in simulated seconds.
    pub duration_secs: u64,
    pub timings: Timings,
    pub channel: ChannelConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            talkers: DEFAULT_TALKERS,
            duration_secs: DEFAULT_DURATION_SECS,
            timings: Timings::default(),
            channel: ChannelConfig::default(),
        }
    }
}

impl SimConfig {
    /// Checks the bounds the core relies on when sizing shared state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.talkers < 2 {
            return Err(ConfigError::TooFewTalkers(self.talkers));
        }
        if self.talkers > MAX_TALKERS {
            return Err(ConfigError::TooManyTalkers {
                count: self.talkers,
                max: MAX_TALKERS,
            });
        }
        if self.duration_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.channel.capacity() == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}
