//! Drives one sender instance's message loop: picks a connection slot, renders the next
//! message, sends it, and handles drops/aborts/batching, matching `sendMessages`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::GeneratorConfig;
use crate::error::SendError;
use crate::fleet::{reopen_slot, Fleet};
use crate::generator::Generator;
use crate::state::AppState;
use crate::util;

/// One generator thread's share of the overall run: `[lower, lower + num_msgs)` message
/// indices, against either a fixed slot (multithreaded mode) or the whole fleet
/// (single-thread fan-out mode).
pub struct SenderInstance {
    pub idx: usize,
    pub lower: u64,
    pub num_msgs: u64,
    pub sent: u64,
}

/// Picks which connection slot message `i` (of `total` in this instance) goes to, matching
/// the original's "first N sequential, last N sequential, middle random" distribution.
fn pick_slot(i: u64, total: u64, num_connections: u64) -> usize {
    if i < num_connections {
        i as usize
    } else if total >= num_connections && i >= total - num_connections {
        (i - (total - num_connections)) as usize
    } else {
        util::random_index(num_connections as usize)
    }
}

pub struct SendOutcome {
    pub sent: u64,
    pub aborted: bool,
}

/// Runs one sender instance to completion against an already-open [`Fleet`].
pub fn send_messages(
    cfg: &GeneratorConfig,
    fleet: &Fleet,
    state: &Arc<AppState>,
    inst: &mut SenderInstance,
) -> Result<SendOutcome, std::io::Error> {
    let mut generator = Generator::new(cfg)?;
    let num_connections = fleet.slots.len() as u64;
    let show_progress_interval = (inst.num_msgs / 100).max(defaults_min_progress());

    let mut last_socknum = 0usize;
    let mut i = 0u64;
    while i < inst.num_msgs {
        let msg_num = if cfg.multithreaded { state.next_msg_num() } else { state.next_msg_num_racy() };

        let body = match generator.fill(msg_num)? {
            Some(body) => body,
            None => break,
        };

        let socknum = if cfg.multithreaded {
            inst.idx
        } else {
            pick_slot(i, inst.num_msgs, num_connections.max(1))
        };

        last_socknum = socknum;
        let result = send_one(cfg, fleet, socknum, &body);
        match result {
            Ok(()) => {}
            Err(SendError::ClosedRemotely) | Err(SendError::SlotClosed) => {
                tracing::warn!(socknum, msg_num, "connection closed remotely");
                if !cfg.no_abort_on_send_fail {
                    return Ok(SendOutcome { sent: inst.sent, aborted: true });
                }
            }
            Err(e) => {
                tracing::error!(socknum, msg_num, error = %e, "send failed");
                if !cfg.no_abort_on_send_fail {
                    return Ok(SendOutcome { sent: inst.sent, aborted: true });
                }
            }
        }

        inst.sent += 1;
        if i % show_progress_interval == 0 && !cfg.silent {
            tracing::info!(sent = i, "progress");
        }

        if !cfg.multithreaded && cfg.drop_connections && num_connections > 0 {
            if util::random_unit() > cfg.drop_probability {
                if let Some(slot) = fleet.slots.get(socknum) {
                    let mut guard = slot.lock().unwrap();
                    let _ = guard.flush();
                    guard.close();
                    state.record_drop();
                }
            }
        }

        if inst.sent % cfg.batch_size == 0 {
            thread::sleep(cfg.wait_time);
        }

        i += 1;
    }

    if let Some(last_slot) = fleet.slots.get(last_socknum) {
        let _ = last_slot.lock().unwrap().flush();
    }

    Ok(SendOutcome { sent: inst.sent, aborted: false })
}

fn defaults_min_progress() -> u64 {
    crate::defaults::min_progress_interval()
}

fn send_one(cfg: &GeneratorConfig, fleet: &Fleet, socknum: usize, body: &[u8]) -> Result<(), SendError> {
    if let Some(udp) = &fleet.udp {
        return udp.send(body);
    }
    let slot_mutex = fleet
        .slots
        .get(socknum)
        .expect("socknum is always in [0, num_connections)");
    let mut slot = slot_mutex.lock().unwrap();
    if slot.is_closed() {
        reopen_slot(cfg, &mut slot).map_err(|e| SendError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    }
    slot.send(body)
}

/// Sleeps `wait` between pacing batches; factored out so tests can call it with a tiny
/// duration without pulling in the whole send loop.
pub fn pace(wait: Duration) {
    if !wait.is_zero() {
        thread::sleep(wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_n_messages_go_sequentially() {
        assert_eq!(pick_slot(0, 100, 10), 0);
        assert_eq!(pick_slot(9, 100, 10), 9);
    }

    #[test]
    fn last_n_messages_go_sequentially() {
        assert_eq!(pick_slot(90, 100, 10), 0);
        assert_eq!(pick_slot(99, 100, 10), 9);
    }

    #[test]
    fn middle_messages_are_in_range() {
        let slot = pick_slot(50, 100, 10);
        assert!(slot < 10);
    }
}
