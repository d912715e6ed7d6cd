//! Command-line surface, mirroring the flag set of the original `tcpflood` test tool
//! (spec §6). Every flag is optional; CLI values take precedence over a loaded config
//! file, which in turn takes precedence over the built-in defaults in [`crate::defaults`].

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[clap(name = "syslog-flood", about = "Multi-transport stress generator for syslog receivers")]
pub struct Cli {
    /// Load a TOML config file layered beneath these flags.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Target address.
    #[clap(short = 't', long = "target")]
    pub target: Option<String>,

    /// Colon-separated target ports, e.g. `13514:13515`. Max 5.
    #[clap(short = 'p', long = "ports")]
    pub ports: Option<String>,

    /// Number of the ports listed in -p that are actually in rotation.
    #[clap(short = 'n', long = "num-ports")]
    pub num_ports: Option<usize>,

    /// Number of connections to open. Negative enables soft-limit mode.
    #[clap(short = 'c', long = "connections", allow_hyphen_values = true)]
    pub connections: Option<i64>,

    /// Total number of messages to send.
    #[clap(short = 'm', long = "messages")]
    pub messages: Option<u64>,

    /// Initial message number.
    #[clap(short = 'i', long = "start-msg-num")]
    pub start_msg_num: Option<u64>,

    /// Syslog PRI value embedded in generated messages.
    #[clap(short = 'P', long = "pri")]
    pub pri: Option<String>,

    /// Hostname embedded in generated messages.
    #[clap(short = 'h', long = "hostname")]
    pub hostname: Option<String>,

    /// Extra-data length to append to each message (bytes), capped at 512KiB.
    #[clap(short = 'd', long = "extra-data-len")]
    pub extra_data_len: Option<usize>,

    /// Randomize the extra-data length in `[1, -d]`.
    #[clap(short = 'r', long = "randomize-extra")]
    pub randomize_extra: bool,

    /// Include a dynafile id in `[0, N)` as a message field.
    #[clap(short = 'f', long = "dynafile-range")]
    pub dynafile_range: Option<u32>,

    /// Frame delimiter byte (US-ASCII code), default LF.
    #[clap(short = 'F', long = "frame-delim")]
    pub frame_delim: Option<u8>,

    /// Fixed message to send verbatim, disabling generation.
    #[clap(short = 'M', long = "fixed-message")]
    pub fixed_message: Option<String>,

    /// Read messages from this file instead of generating them.
    #[clap(short = 'I', long = "data-file")]
    pub data_file: Option<PathBuf>,

    /// Treat the `-I` file as binary (no record delimiter awareness).
    #[clap(short = 'B', long = "binary-file")]
    pub binary_file: bool,

    /// Number of times to replay the `-I` file.
    #[clap(short = 'C', long = "iterations")]
    pub iterations: Option<u32>,

    /// Randomly drop and re-establish connections.
    #[clap(short = 'D', long = "drop-connections")]
    pub drop_connections: bool,

    /// Drop probability floor in `[0.0, 1.0]`.
    #[clap(short = 'l', long = "drop-probability")]
    pub drop_probability: Option<f64>,

    /// Number of times to run the whole test.
    #[clap(short = 'R', long = "runs")]
    pub runs: Option<u32>,

    /// Seconds to sleep between runs.
    #[clap(short = 'S', long = "sleep-between-runs")]
    pub sleep_between_runs: Option<u64>,

    /// Emit a statistics summary record at the end.
    #[clap(short = 'X', long = "stats")]
    pub stats: bool,

    /// Encode statistics output as CSV.
    #[clap(short = 'e', long = "csv")]
    pub csv: bool,

    /// Transport: udp, tcp, tls, dtls, relp-plain, relp-tls.
    #[clap(short = 'T', long = "transport")]
    pub transport: Option<String>,

    /// Number of messages per pacing batch.
    #[clap(short = 'b', long = "batch-size")]
    pub batch_size: Option<u64>,

    /// Microseconds to sleep between batches.
    #[clap(short = 'W', long = "wait-time")]
    pub wait_time_us: Option<u64>,

    /// One sender thread per connection.
    #[clap(short = 'Y', long = "multithreaded")]
    pub multithreaded: bool,

    /// Use RFC5424-formatted messages.
    #[clap(short = 'y', long = "rfc5424")]
    pub rfc5424: bool,

    /// Emit JSON payloads with the given cookie string prepended.
    #[clap(short = 'j', long = "json-cookie")]
    pub json_cookie: Option<String>,

    /// Prepend RFC 6587 octet-count framing to every message.
    #[clap(short = 'O', long = "octet-count-framed")]
    pub octet_count_framed: bool,

    /// TLS/RELP-TLS CA certificate file.
    #[clap(short = 'x', long = "tls-ca")]
    pub tls_ca: Option<PathBuf>,

    /// TLS/RELP-TLS private key file.
    #[clap(short = 'z', long = "tls-key")]
    pub tls_key: Option<PathBuf>,

    /// TLS/RELP-TLS certificate file.
    #[clap(short = 'Z', long = "tls-cert")]
    pub tls_cert: Option<PathBuf>,

    /// RELP authentication mode.
    #[clap(short = 'a', long = "relp-auth-mode")]
    pub relp_auth_mode: Option<String>,

    /// RELP permitted peer.
    #[clap(short = 'E', long = "relp-permitted-peer")]
    pub relp_permitted_peer: Option<String>,

    /// RELP TLS library selection (kept for CLI compatibility; this implementation always
    /// uses OpenSSL).
    #[clap(short = 'u', long = "relp-tls-lib")]
    pub relp_tls_lib: Option<String>,

    /// TLS diagnostic log level, 0-10.
    #[clap(short = 'L', long = "tls-log-level")]
    pub tls_log_level: Option<u8>,

    /// Number of threads used to open connections.
    #[clap(short = 'o', long = "opener-threads")]
    pub opener_threads: Option<usize>,

    /// Custom TLS configuration command, `key=value`. May be repeated.
    #[clap(short = 'k', long = "tls-custom-config")]
    pub tls_custom_config: Vec<String>,

    /// Do not abort the run on a send failure.
    #[clap(short = 'A', long = "no-abort-on-send-fail")]
    pub no_abort_on_send_fail: bool,

    /// Suppress progress output.
    #[clap(short = 's', long = "silent")]
    pub silent: bool,

    /// Verbose diagnostic output.
    #[clap(short = 'v', long = "verbose")]
    pub verbose: bool,
}
