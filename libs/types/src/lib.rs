//! Shared identities, constants, and configuration for the chatter simulation.
//!
//! Everything in this crate is plain data: talker identities, the record
//! sentinel recognized by every log reader, and the validated simulation
//! configuration consumed by the engine and the channel layer.

pub mod config;

pub use config::{ChannelConfig, ConfigError, SimConfig, Timings};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard cap on the number of talkers in one simulation.
pub const MAX_TALKERS: usize = 64;

/// Terminal log record value. A reader that receives this line stops
/// consuming; ordinary records never equal it.
pub const STOP_SENTINEL: &str = "STOP";

/// Identity of one talker, unique within a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TalkerId(u32);

impl TalkerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Index into per-talker tables (busy flags).
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TalkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
