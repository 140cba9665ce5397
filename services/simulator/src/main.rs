//! The `chatter` binary: wires CLI arguments into a simulation run and
//! echoes every observed log record.

use anyhow::{Context, Result};
use chatter_engine::Coordinator;
use chatter_types::config::{DEFAULT_QUEUE_CAPACITY, DEFAULT_RING_CAPACITY};
use chatter_types::{ChannelConfig, SimConfig, Timings};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Bounded message queue; producers block when it fills up.
    Queue,
    /// Shared circular log buffer; slow observers skip old records.
    Ring,
}

#[derive(Debug, Parser)]
#[command(name = "chatter", about = "Simulate talkers making pairwise exclusive calls")]
struct Cli {
    /// Number of talker actors.
    #[arg(long, default_value_t = 5)]
    talkers: usize,

    /// Simulation duration in seconds.
    #[arg(long, default_value_t = 25)]
    duration: u64,

    /// Minimum idle pause between call attempts, seconds.
    #[arg(long, default_value_t = 1)]
    min_pause: u64,

    /// Maximum idle pause between call attempts, seconds.
    #[arg(long, default_value_t = 3)]
    max_pause: u64,

    /// Minimum call duration, seconds.
    #[arg(long, default_value_t = 1)]
    min_talk: u64,

    /// Maximum call duration, seconds.
    #[arg(long, default_value_t = 4)]
    max_talk: u64,

    /// Log transport carrying records to the observer.
    #[arg(long, value_enum, default_value_t = Backend::Queue)]
    channel: Backend,

    /// Log channel capacity; defaults to 10 for the queue and 256 for the
    /// ring.
    #[arg(long)]
    capacity: Option<usize>,
}

impl Cli {
    fn into_config(self) -> SimConfig {
        let channel = match self.channel {
            Backend::Queue => ChannelConfig::Queue {
                capacity: self.capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY),
            },
            Backend::Ring => ChannelConfig::Ring {
                capacity: self.capacity.unwrap_or(DEFAULT_RING_CAPACITY),
            },
        };
        SimConfig {
            talkers: self.talkers,
            duration_secs: self.duration,
            timings: Timings {
                min_pause: self.min_pause,
                max_pause: self.max_pause,
                min_talk: self.min_talk,
                max_talk: self.max_talk,
            },
            channel,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Cli::parse().into_config();
    config
        .validate()
        .context("invalid simulation configuration")?;

    let report = Coordinator::launch(&config, |record| {
        println!("[obs] {}", record.line);
    })
    .run()
    .await
    .context("simulation failed")?;

    info!(
        records = report.records_observed,
        skipped = report.records_skipped,
        calls = report.metrics.calls_completed,
        rejected = report.metrics.reservations_failed,
        "simulation complete"
    );
    Ok(())
}
