//! Orchestrates one or more complete test runs: spins up the generator threads, releases
//! them together through a start barrier, waits for them to finish, and aggregates timing.
//!
//! The original coordinated this with a mutex and two condition variables (one signaling
//! "thread has started", one signaling "all threads may run"). A [`std::sync::Barrier`]
//! collapses both into a single rendezvous point with the same effect: no sender thread
//! sends a byte until every thread in the run has finished connecting/initializing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

use crate::config::GeneratorConfig;
use crate::defaults;
use crate::fleet::Fleet;
use crate::sender::{send_messages, SenderInstance};
use crate::state::AppState;
use crate::stats::{RunStats, RunTiming};

/// Result of a single run: whether every sender completed without aborting, and how long it
/// took end-to-end.
pub struct RunResult {
    pub timing: RunTiming,
    pub aborted: bool,
    pub total_sent: u64,
}

/// Runs the generator threads for one pass over `cfg` against the already-open `fleet`.
///
/// `connection_count` is the resolved `-c` value: in multithreaded mode it is the thread
/// count regardless of transport (UDP and DTLS fleets don't carry one slot per connection,
/// so deriving the thread count from `fleet.slots.len()` would undercount them).
pub fn run_once(cfg: &Arc<GeneratorConfig>, fleet: &Arc<Fleet>, state: &Arc<AppState>, connection_count: u64) -> RunResult {
    let num_threads = if cfg.multithreaded { (connection_count as usize).max(1) } else { 1 };
    let msgs_per_thread = cfg.messages / num_threads as u64;

    let barrier = Arc::new(Barrier::new(num_threads + 1));
    let aborted = Arc::new(AtomicBool::new(false));
    let total_sent = Arc::new(std::sync::atomic::AtomicU64::new(0));

    let mut handles = Vec::with_capacity(num_threads);
    for t in 0..num_threads {
        let cfg = Arc::clone(cfg);
        let fleet = Arc::clone(fleet);
        let state = Arc::clone(state);
        let barrier = Arc::clone(&barrier);
        let aborted = Arc::clone(&aborted);
        let total_sent = Arc::clone(&total_sent);
        let lower = t as u64 * msgs_per_thread;

        handles.push(
            thread::Builder::new()
                .stack_size(defaults::worker_stack_size())
                .spawn(move || {
                    barrier.wait();
                    let mut inst = SenderInstance { idx: t, lower, num_msgs: msgs_per_thread, sent: 0 };
                    match send_messages(&cfg, &fleet, &state, &mut inst) {
                        Ok(outcome) => {
                            total_sent.fetch_add(outcome.sent, Ordering::Relaxed);
                            if outcome.aborted {
                                aborted.store(true, Ordering::Relaxed);
                            }
                        }
                        Err(e) => {
                            tracing::error!(thread = t, error = %e, "sender thread failed");
                            aborted.store(true, Ordering::Relaxed);
                        }
                    }
                })
                .expect("failed to spawn sender thread"),
        );
    }

    let start = Instant::now();
    // Release every sender thread at once; this is the single rendezvous point that
    // replaces the original's `doRun`/`condDoRun` broadcast.
    barrier.wait();

    for h in handles {
        let _ = h.join();
    }
    let runtime = start.elapsed();

    RunResult {
        timing: RunTiming { runtime },
        aborted: aborted.load(Ordering::Relaxed),
        total_sent: total_sent.load(Ordering::Relaxed),
    }
}

/// Runs the whole invocation: `cfg.runs` repetitions of [`run_once`], sleeping
/// `sleep_between_runs` between them, aggregating into [`RunStats`].
pub fn run_tests(
    cfg: &Arc<GeneratorConfig>,
    fleet: &Arc<Fleet>,
    state: &Arc<AppState>,
    connection_count: u64,
    runs: u32,
    sleep_between_runs: std::time::Duration,
    csv: bool,
) -> (RunStats, Vec<String>) {
    let mut stats = RunStats::new();
    let mut lines = Vec::new();

    for run in 0..runs {
        let result = run_once(cfg, fleet, state, connection_count);
        stats.record(result.timing);
        lines.push(crate::stats::format_run_line(result.timing, csv));
        if result.aborted {
            tracing::warn!(run, "run aborted due to send failure");
        }
        if run + 1 < runs {
            thread::sleep(sleep_between_runs);
        }
    }

    (stats, lines)
}
