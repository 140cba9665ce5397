//! Lifecycle coordination: spawn, supervise, stop, tear down exactly once.
//!
//! The coordinator owns every shared handle for one simulation run. A stop
//! arrives either from the wall-clock duration or from an interrupt; both
//! funnel into the same path: raise the shared stop flag, broadcast a wake
//! so no talker sleeps through it, join every talker, deliver the sentinel,
//! then join the observer. `shutdown` consumes the coordinator, so teardown
//! cannot run twice.

use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::talker::Talker;
use crate::EngineError;
use chatter_channel::{log_channel, LogRecord, LogWriter};
use chatter_state::SimState;
use chatter_types::SimConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimReport {
    /// Records the observer consumed.
    pub records_observed: u64,
    /// Records a lossy transport overwrote before the observer got to them.
    pub records_skipped: u64,
    pub metrics: MetricsSnapshot,
}

struct ObserverReport {
    records: u64,
    skipped: u64,
}

/// Owns one simulation run end to end.
pub struct Coordinator {
    state: Arc<SimState>,
    writer: LogWriter,
    wake: watch::Sender<bool>,
    talkers: Vec<JoinHandle<Result<(), EngineError>>>,
    observer: JoinHandle<ObserverReport>,
    duration: Duration,
    metrics: Arc<EngineMetrics>,
}

impl Coordinator {
    /// Sizes the shared state, builds the configured log channel, and
    /// spawns the observer plus one task per talker. Each consumed record
    /// is handed to `on_record` (the binary echoes them; tests collect
    /// them).
    pub fn launch<F>(config: &SimConfig, mut on_record: F) -> Self
    where
        F: FnMut(LogRecord) + Send + 'static,
    {
        let state = SimState::new(config.talkers);
        let (writer, mut reader) = log_channel(config.channel, Arc::clone(&state));
        let (wake, _) = watch::channel(false);
        let metrics = Arc::new(EngineMetrics::default());

        let observer = tokio::spawn(async move {
            let mut records = 0u64;
            while let Some(record) = reader.next().await {
                records += 1;
                on_record(record);
            }
            ObserverReport {
                records,
                skipped: reader.skipped(),
            }
        });

        let talkers = (0..config.talkers)
            .map(|_| {
                let talker = Talker::new(
                    state.assign_id(),
                    Arc::clone(&state),
                    writer.clone(),
                    config.timings,
                    Duration::from_secs(config.duration_secs),
                    Arc::clone(&metrics),
                    wake.subscribe(),
                );
                tokio::spawn(talker.run())
            })
            .collect();

        info!(
            talkers = config.talkers,
            duration_secs = config.duration_secs,
            channel = ?config.channel,
            "simulation launched"
        );

        Self {
            state,
            writer,
            wake,
            talkers,
            observer,
            duration: Duration::from_secs(config.duration_secs),
            metrics,
        }
    }

    /// Handle for issuing external stop requests (tests, embedding).
    pub fn state(&self) -> Arc<SimState> {
        Arc::clone(&self.state)
    }

    /// Runs until the configured duration elapses or an interrupt arrives,
    /// then tears the run down.
    pub async fn run(self) -> Result<SimReport, EngineError> {
        tokio::select! {
            _ = tokio::time::sleep(self.duration) => {
                info!("simulation duration elapsed");
            }
            result = tokio::signal::ctrl_c() => {
                // The signal handler itself does nothing but complete this
                // future; all shutdown work happens here at the poll point.
                if let Err(e) = result {
                    warn!(error = %e, "interrupt handler unavailable, stopping on timer");
                }
                info!("interrupt received");
            }
        }
        self.shutdown().await
    }

    /// Ordered, exactly-once teardown: stop flag, wake broadcast, talkers,
    /// sentinel, observer. Consuming `self` makes a second teardown
    /// unrepresentable; a second stop request is already a no-op.
    pub async fn shutdown(self) -> Result<SimReport, EngineError> {
        self.state.request_stop();
        // Wake every sleeping talker so the flag is observed immediately.
        let _ = self.wake.send(true);

        for handle in self.talkers {
            handle
                .await
                .map_err(|e| EngineError::TaskFailed(e.to_string()))??;
        }

        // All producers are done; the sentinel is the last record.
        self.writer.emit_sentinel().await?;
        drop(self.writer);

        let observed = self
            .observer
            .await
            .map_err(|e| EngineError::TaskFailed(e.to_string()))?;

        if observed.skipped > 0 {
            warn!(skipped = observed.skipped, "observer missed overwritten records");
        }
        let report = SimReport {
            records_observed: observed.records,
            records_skipped: observed.skipped,
            metrics: self.metrics.snapshot(),
        };
        info!(
            records = report.records_observed,
            calls = report.metrics.calls_completed,
            "simulation torn down"
        );
        Ok(report)
    }
}
