//! Error taxonomy for the flood generator, grouped by the subsystem that raises them.
//!
//! Configuration and resource errors are fatal and surface through `anyhow` at the
//! binary boundary; per-connection and per-message errors are typed so callers can
//! decide whether a failure is fatal (per spec: aborts the run) or merely logged and
//! counted.

use std::io;
use thiserror::Error;

/// Errors raised while parsing or validating the command line / config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("-d/--extra-data-len max is {max} bytes, got {got}")]
    ExtraDataTooLong { max: usize, got: usize },
    #[error("-p/--port accepts at most 5 target ports, got {0}")]
    TooManyPorts(usize),
    #[error("unknown transport '{0}'; expected udp, tcp, tls, dtls, relp-plain, relp-tls")]
    UnknownTransport(String),
    #[error("failed to read config file {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors raised while establishing or tearing down the connection fleet.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("could not raise open-file descriptor limit to {requested}: {source}")]
    DescriptorLimit { requested: u64, source: io::Error },
    #[error(
        "requested {requested} connections, but the OS permits only {limit} open descriptors"
    )]
    DescriptorLimitExceeded { requested: u64, limit: u64 },
    #[error("connect to {addr} failed after {retries} retries: {source}")]
    ConnectFailed {
        addr: String,
        retries: u32,
        source: io::Error,
    },
    #[error("TLS handshake with {addr} failed: {reason}")]
    HandshakeFailed { addr: String, reason: String },
    #[error("RELP connect to {addr} failed: {reason}")]
    RelpConnectFailed { addr: String, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised while sending a single message on an already-open connection slot.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("connection closed remotely")]
    ClosedRemotely,
    #[error("send failed: {0}")]
    Io(#[from] io::Error),
    #[error("RELP send failed with code {0}")]
    RelpFailed(i32),
    #[error("slot is closed and must be re-opened before sending")]
    SlotClosed,
}
