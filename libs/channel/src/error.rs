use thiserror::Error;

/// Errors surfaced by log channel operations.
///
/// Transient conditions (full queue, caught-up reader) are handled inside
/// the channel by waiting; only a torn-down channel is an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The consuming side is gone; the record cannot be delivered.
    #[error("log channel closed")]
    Closed,
}
