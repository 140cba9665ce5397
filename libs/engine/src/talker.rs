//! The talker state machine.
//!
//! Each talker loops: sleep a bounded random pause, pick a random distinct
//! target, try to reserve the pair, hold the call for a bounded random
//! duration, release, and emit a record for each step. The stop flag is
//! polled at every suspension point and both sleeps also listen for the
//! coordinator's wake-up, so shutdown latency is bounded by one scheduling
//! delay rather than one full sleep.

use crate::metrics::EngineMetrics;
use crate::EngineError;
use chatter_channel::LogWriter;
use chatter_state::SimState;
use chatter_types::{TalkerId, Timings};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// Give up on target selection after this many draws per talker in the
/// simulation.
const SELECTION_ATTEMPTS_PER_TALKER: u32 = 4;

/// One talker actor.
pub struct Talker {
    id: TalkerId,
    state: Arc<SimState>,
    writer: LogWriter,
    timings: Timings,
    deadline: Duration,
    metrics: Arc<EngineMetrics>,
    shutdown: watch::Receiver<bool>,
    rng: SmallRng,
}

impl Talker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TalkerId,
        state: Arc<SimState>,
        writer: LogWriter,
        timings: Timings,
        deadline: Duration,
        metrics: Arc<EngineMetrics>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            state,
            writer,
            timings,
            deadline,
            metrics,
            shutdown,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Runs the talker until the stop flag is observed or its own deadline
    /// elapses. Either way the final record is the shutdown line, emitted
    /// outside any lock.
    pub async fn run(mut self) -> Result<(), EngineError> {
        self.writer
            .emit(format!(
                "[{}] started (talkers={})",
                self.id,
                self.state.total()
            ))
            .await?;

        let deadline = Instant::now() + self.deadline;

        loop {
            if self.state.stop_requested() || Instant::now() >= deadline {
                break;
            }

            let pause = self.random_interval(self.timings.min_pause, self.timings.max_pause);
            if !self.sleep_or_wake(pause).await {
                break;
            }
            if self.state.stop_requested() || Instant::now() >= deadline {
                break;
            }

            let Some(target) = self.pick_target() else {
                self.metrics.record_selection_exhausted();
                continue;
            };

            // reserve re-checks the stop flag under the lock, so a stop
            // racing with this attempt fails it cleanly with no flags set.
            if !self.state.reserve(self.id, target) {
                self.metrics.record_reservation_failed();
                debug!(talker = %self.id, callee = %target, "reservation refused, retrying next cycle");
                continue;
            }

            self.writer
                .emit(format!(
                    "[{}] calling {} (waited {} s)",
                    self.id, target, pause
                ))
                .await?;

            let talk = self.random_interval(self.timings.min_talk, self.timings.max_talk);
            // A wake-up cuts the call short, but the pair is still released
            // and the completion record still emitted.
            self.sleep_or_wake(talk).await;
            self.state.release(self.id, target);

            self.writer
                .emit(format!(
                    "[{}] finished call with {} after {} s",
                    self.id, target, talk
                ))
                .await?;
            self.metrics.record_call_completed();
        }

        // The shutdown record goes out before this talker raises the stop
        // flag: once stop is visible, a drained ring reader is free to end
        // the stream, and anything published after that is unobservable.
        self.writer
            .emit(format!("[{}] shutting down", self.id))
            .await?;
        // A talker reaching its own deadline winds down the whole
        // simulation, matching the shared-duration semantics.
        self.state.request_stop();
        debug!(talker = %self.id, "stopped");
        Ok(())
    }

    /// Uniform draw over an inclusive range of simulated seconds; a
    /// degenerate range fixes the interval at `min`.
    fn random_interval(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            min
        } else {
            self.rng.gen_range(min..=max)
        }
    }

    /// Uniform random target distinct from self, bounded retry. `None`
    /// abandons the cycle; it is never an error.
    fn pick_target(&mut self) -> Option<TalkerId> {
        let total = self.state.total() as u32;
        let attempts = SELECTION_ATTEMPTS_PER_TALKER * total;
        for _ in 0..attempts {
            let candidate = TalkerId::new(self.rng.gen_range(0..total));
            if candidate != self.id {
                return Some(candidate);
            }
        }
        None
    }

    /// Sleeps for `secs` simulated seconds. Returns `false` when the sleep
    /// was cut short by the coordinator's shutdown wake-up.
    async fn sleep_or_wake(&mut self, secs: u64) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(secs)) => true,
            _ = self.shutdown.changed() => false,
        }
    }
}
