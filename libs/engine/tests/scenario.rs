//! End-to-end simulation scenarios over both channel backends, driven on
//! the paused Tokio clock so simulated seconds cost nothing.

use chatter_engine::Coordinator;
use chatter_types::{ChannelConfig, SimConfig, Timings};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

fn lockstep_config(channel: ChannelConfig) -> SimConfig {
    SimConfig {
        talkers: 3,
        duration_secs: 5,
        timings: Timings {
            min_pause: 1,
            max_pause: 1,
            min_talk: 1,
            max_talk: 1,
        },
        channel,
    }
}

fn collector() -> (Arc<Mutex<Vec<String>>>, impl FnMut(chatter_channel::LogRecord)) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let lines = Arc::clone(&lines);
        move |record: chatter_channel::LogRecord| {
            lines.lock().unwrap().push(record.line);
        }
    };
    (lines, sink)
}

/// Parses "[a] calling b (waited S s)" / "[a] finished call with b after S s"
/// and checks that no party appears in a second reservation before its
/// current call finished.
fn assert_calls_are_exclusive(lines: &[String]) {
    let mut in_call: HashSet<u32> = HashSet::new();
    let mut open_pairs: Vec<(u32, u32)> = Vec::new();

    let leading_id = |line: &str| -> u32 {
        line.trim_start_matches('[')
            .split(']')
            .next()
            .unwrap()
            .parse()
            .unwrap()
    };

    for line in lines {
        if line.contains("] calling ") {
            let caller = leading_id(line);
            let callee: u32 = line
                .split("calling ")
                .nth(1)
                .unwrap()
                .split_whitespace()
                .next()
                .unwrap()
                .parse()
                .unwrap();
            assert!(
                in_call.insert(caller),
                "caller {caller} reserved while already in a call: {line}"
            );
            assert!(
                in_call.insert(callee),
                "callee {callee} reserved while already in a call: {line}"
            );
            open_pairs.push((caller, callee));
        } else if line.contains("] finished call with ") {
            let caller = leading_id(line);
            let callee: u32 = line
                .split("finished call with ")
                .nth(1)
                .unwrap()
                .split_whitespace()
                .next()
                .unwrap()
                .parse()
                .unwrap();
            let index = open_pairs
                .iter()
                .position(|&pair| pair == (caller, callee))
                .unwrap_or_else(|| panic!("finished without matching calling: {line}"));
            open_pairs.remove(index);
            in_call.remove(&caller);
            in_call.remove(&callee);
        }
    }

    assert!(
        open_pairs.is_empty(),
        "calls left open at end of run: {open_pairs:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn lockstep_scenario_terminates_on_time_queue() {
    let config = lockstep_config(ChannelConfig::Queue { capacity: 64 });
    let (lines, sink) = collector();

    let started = Instant::now();
    let report = Coordinator::launch(&config, sink).run().await.unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed >= Duration::from_secs(5) && elapsed <= Duration::from_secs(7),
        "expected termination within 6-7 simulated seconds, took {elapsed:?}"
    );

    let lines = lines.lock().unwrap();
    let started_lines = lines.iter().filter(|l| l.contains("] started")).count();
    let shutdown_lines = lines.iter().filter(|l| l.contains("] shutting down")).count();
    assert_eq!(started_lines, 3);
    assert_eq!(shutdown_lines, 3);
    assert_calls_are_exclusive(&lines);

    assert_eq!(report.records_observed as usize, lines.len());
    assert_eq!(report.records_skipped, 0);
    let finished = lines
        .iter()
        .filter(|l| l.contains("] finished call with "))
        .count() as u64;
    assert_eq!(report.metrics.calls_completed, finished);
}

#[tokio::test(start_paused = true)]
async fn lockstep_scenario_terminates_on_time_ring() {
    let config = lockstep_config(ChannelConfig::Ring { capacity: 256 });
    let (lines, sink) = collector();

    let started = Instant::now();
    let report = Coordinator::launch(&config, sink).run().await.unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed >= Duration::from_secs(5) && elapsed <= Duration::from_secs(7),
        "expected termination within 6-7 simulated seconds, took {elapsed:?}"
    );

    let lines = lines.lock().unwrap();
    assert_calls_are_exclusive(&lines);
    // A 256-slot ring never laps three talkers over five seconds.
    assert_eq!(report.records_skipped, 0);
    // Ring records arrive in one global sequence order.
    assert_eq!(report.records_observed as usize, lines.len());
    // Every talker's final record makes it out before the stream ends,
    // even on the lossy transport.
    assert_eq!(
        lines.iter().filter(|l| l.contains("] shutting down")).count(),
        3
    );
    assert_eq!(lines.iter().filter(|l| l.contains("] started")).count(), 3);
}

#[tokio::test(start_paused = true)]
async fn external_stop_converges_promptly() {
    let config = SimConfig {
        talkers: 4,
        duration_secs: 10_000,
        timings: Timings::default(),
        channel: ChannelConfig::Queue { capacity: 64 },
    };
    let (lines, sink) = collector();
    let coordinator = Coordinator::launch(&config, sink);
    let state = coordinator.state();

    // Let a few cycles happen, then stop long before the duration.
    tokio::time::sleep(Duration::from_secs(10)).await;
    state.request_stop();
    state.request_stop(); // idempotent from any number of callers

    let stop_issued = Instant::now();
    let report = coordinator.shutdown().await.unwrap();
    assert!(
        stop_issued.elapsed() <= Duration::from_secs(5),
        "talkers did not converge after stop"
    );

    let lines = lines.lock().unwrap();
    assert_eq!(
        lines.iter().filter(|l| l.contains("] shutting down")).count(),
        4
    );
    assert_calls_are_exclusive(&lines);
    assert_eq!(report.records_observed as usize, lines.len());
}

#[tokio::test(start_paused = true)]
async fn talker_deadline_winds_down_the_whole_run() {
    // The coordinator would run for 10000 s, but each talker's own
    // deadline is 3 s and an expiring talker raises the shared stop flag.
    let config = SimConfig {
        talkers: 3,
        duration_secs: 3,
        timings: Timings {
            min_pause: 1,
            max_pause: 1,
            min_talk: 1,
            max_talk: 1,
        },
        channel: ChannelConfig::Queue { capacity: 64 },
    };
    let (lines, sink) = collector();
    let coordinator = Coordinator::launch(&config, sink);

    // Wait past every talker deadline without touching the coordinator.
    tokio::time::sleep(Duration::from_secs(6)).await;
    let state = coordinator.state();
    assert!(state.stop_requested(), "expiring talker should raise stop");

    let report = coordinator.shutdown().await.unwrap();
    let lines = lines.lock().unwrap();
    assert_eq!(
        lines.iter().filter(|l| l.contains("] shutting down")).count(),
        3
    );
    assert_calls_are_exclusive(&lines);
    assert!(report.metrics.calls_completed > 0);
}
