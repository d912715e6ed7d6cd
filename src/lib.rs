//! Multi-transport stress generator for syslog receivers.
//!
//! A fleet of client connections (UDP, TCP, TLS, DTLS, or RELP) is opened against a target,
//! filled with generated or replayed syslog traffic at a configurable rate, and optionally
//! torn down and reopened mid-run to exercise reconnect handling on the receiving side.

pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod fleet;
pub mod generator;
pub mod runner;
pub mod sender;
pub mod state;
pub mod stats;
pub mod timeout;
pub mod transport;
pub mod util;
