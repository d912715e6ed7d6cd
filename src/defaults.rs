use directories::ProjectDirs;
use std::{path::PathBuf, time::Duration};

fn project_dirs() -> Result<ProjectDirs, anyhow::Error> {
    ProjectDirs::from("", ORGANIZATION, APPLICATION)
        .ok_or_else(|| anyhow::anyhow!("Could not open user's home directory"))
}

pub const ORGANIZATION: &str = "";

pub const APPLICATION: &str = "syslog-flood";

pub const CONFIG_FILE: &str = "syslog-flood.toml";

pub fn config_path() -> Result<PathBuf, anyhow::Error> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
}

/// Maximum extra-data payload the generator will ever append (`-d`).
pub const MAX_EXTRADATA_LEN: usize = 512 * 1024;

/// Coalescing ceiling for the TLS send buffer: twice the max extra-data length.
pub const MAX_SENDBUF: usize = 2 * MAX_EXTRADATA_LEN;

/// TLS receive scratch buffer, sized per RFC 8449's maximum record framing overhead.
pub const MAX_RCVBUF: usize = 16 * 1024 + 1;

/// Headroom reserved below the descriptor soft limit before a connection count is rejected.
pub const DESCRIPTOR_HEADROOM: u64 = 20;

/// Connection counts at or below this value never trigger a descriptor-limit raise.
pub const DESCRIPTOR_RAISE_THRESHOLD: u64 = 20;

pub const fn target_ip() -> &'static str {
    "127.0.0.1"
}

pub const fn target_port() -> u16 {
    13514
}

pub const fn pri() -> &'static str {
    "167"
}

pub const fn hostname() -> &'static str {
    "172.20.245.8"
}

pub const fn opener_threads() -> usize {
    25
}

pub const fn drop_probability() -> f64 {
    0.95
}

pub const fn num_runs() -> u32 {
    1
}

pub const fn sleep_between_runs() -> Duration {
    Duration::from_secs(30)
}

pub const fn batch_size() -> u64 {
    100_000_000
}

pub const fn frame_delim() -> u8 {
    b'\n'
}

/// TCP connect is retried this many times before the opener gives up on a slot.
pub const fn connect_retries() -> u32 {
    50
}

pub const fn connect_retry_delay() -> Duration {
    Duration::from_millis(100)
}

/// Fixed RELP protocol timeout used for every `connect`, per spec §4.1.
pub const fn relp_connect_timeout() -> Duration {
    Duration::from_secs(2)
}

/// DTLS datagram receive timeout, per spec §5.
pub const fn dtls_recv_timeout() -> Duration {
    Duration::from_secs(3)
}

/// Worker thread stack size, per spec §4.4.
pub const fn worker_stack_size() -> usize {
    4 * 1024 * 1024
}

/// TCP `SO_LINGER` applied before close, per spec §4.1.
pub const fn linger_seconds() -> i32 {
    1
}

/// Progress is printed at least this often even for very small runs.
pub const fn min_progress_interval() -> u64 {
    100
}
