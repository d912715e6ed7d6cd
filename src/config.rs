//! Resolved run configuration: CLI flags layered over an optional TOML file layered over
//! built-in defaults (spec §6, EXPANSION).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::defaults;
use crate::error::ConfigError;

/// Which wire transport a run drives, mirroring the five `Transport` implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Udp,
    Tcp,
    Tls,
    Dtls,
    RelpPlain,
    RelpTls,
}

impl TransportKind {
    pub fn is_tls(self) -> bool {
        matches!(self, TransportKind::Tls | TransportKind::Dtls | TransportKind::RelpTls)
    }

    pub fn is_relp(self) -> bool {
        matches!(self, TransportKind::RelpPlain | TransportKind::RelpTls)
    }
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "udp" => Ok(TransportKind::Udp),
            "tcp" => Ok(TransportKind::Tcp),
            "tls" => Ok(TransportKind::Tls),
            "dtls" => Ok(TransportKind::Dtls),
            "relp-plain" => Ok(TransportKind::RelpPlain),
            "relp-tls" => Ok(TransportKind::RelpTls),
            other => Err(ConfigError::UnknownTransport(other.to_string())),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportKind::Udp => "udp",
            TransportKind::Tcp => "tcp",
            TransportKind::Tls => "tls",
            TransportKind::Dtls => "dtls",
            TransportKind::RelpPlain => "relp-plain",
            TransportKind::RelpTls => "relp-tls",
        };
        f.write_str(s)
    }
}

/// TLS/RELP-TLS material, present only when the chosen transport needs it.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub log_level: u8,
    /// Raw `key=value` custom settings from repeated `-k`, applied best-effort.
    pub custom: Vec<(String, String)>,
}

/// RELP-specific settings, present only for `relp-plain`/`relp-tls`.
#[derive(Debug, Clone, Default)]
pub struct RelpConfig {
    pub auth_mode: Option<String>,
    pub permitted_peer: Option<String>,
}

/// How the generator produces each message's body.
#[derive(Debug, Clone)]
pub enum MessageSource {
    /// Synthesize a message per spec §4.2's decision tree.
    Generated {
        extra_data_len: usize,
        randomize_extra: bool,
        dynafile_range: Option<u32>,
        rfc5424: bool,
        json_cookie: Option<String>,
    },
    /// Send this exact string on every call, unmodified.
    Fixed(String),
    /// Replay lines (or raw bytes, if `binary`) from a file, `iterations` times.
    DataFile { path: PathBuf, binary: bool, iterations: u32 },
}

/// Fully resolved parameters for one test run (spec §2 `GeneratorConfig`).
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub target: String,
    /// Up to 5 parsed ports from `-p`.
    pub ports: Vec<u16>,
    /// How many of `ports` are actually in rotation (`-n`), independent of `ports.len()`.
    pub num_ports: usize,
    pub connections: i64,
    pub messages: u64,
    pub start_msg_num: u64,
    pub pri: String,
    pub hostname: String,
    pub frame_delim: u8,
    pub octet_count_framed: bool,
    pub message_source: MessageSource,
    pub drop_connections: bool,
    pub drop_probability: f64,
    pub transport: TransportKind,
    pub tls: TlsConfig,
    pub relp: RelpConfig,
    pub batch_size: u64,
    pub wait_time: Duration,
    pub multithreaded: bool,
    pub opener_threads: usize,
    pub no_abort_on_send_fail: bool,
    pub silent: bool,
    pub verbose: bool,
}

impl GeneratorConfig {
    pub fn active_ports(&self) -> &[u16] {
        let n = self.num_ports.min(self.ports.len()).max(1);
        &self.ports[..n]
    }
}

/// Top-level parameters for the whole invocation (spec §2 `RunParams`): how many times to
/// repeat [`GeneratorConfig`] and whether/how to report aggregate statistics.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub runs: u32,
    pub sleep_between_runs: Duration,
    pub emit_stats: bool,
    pub csv: bool,
    pub generator: GeneratorConfig,
}

/// Curated subset of fields that may come from a TOML config file. CLI flags always win.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub target: Option<String>,
    pub ports: Option<String>,
    pub num_ports: Option<usize>,
    pub connections: Option<i64>,
    pub transport: Option<String>,
    pub pri: Option<String>,
    pub hostname: Option<String>,
    #[serde(with = "humantime_serde::option", default)]
    pub sleep_between_runs: Option<Duration>,
    pub runs: Option<u32>,
    pub opener_threads: Option<usize>,
    pub tls_ca: Option<PathBuf>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }
}

fn parse_ports(spec: &str) -> Result<Vec<u16>, ConfigError> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() > 5 {
        return Err(ConfigError::TooManyPorts(parts.len()));
    }
    Ok(parts
        .into_iter()
        .filter_map(|p| p.parse::<u16>().ok())
        .collect())
}

/// Resolves a [`RunParams`] from parsed CLI flags, optionally layering an on-disk config
/// file beneath them.
pub fn resolve(cli: &Cli) -> Result<RunParams, ConfigError> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let target = cli
        .target
        .clone()
        .or(file.target)
        .unwrap_or_else(|| defaults::target_ip().to_string());

    let ports = match cli.ports.clone().or(file.ports) {
        Some(spec) => parse_ports(&spec)?,
        None => vec![defaults::target_port()],
    };
    let ports = if ports.is_empty() { vec![defaults::target_port()] } else { ports };

    let num_ports = cli.num_ports.or(file.num_ports).unwrap_or(1);

    let transport_str = cli
        .transport
        .clone()
        .or(file.transport)
        .unwrap_or_else(|| "udp".to_string());
    let transport: TransportKind = transport_str.parse()?;

    let extra_data_len = cli.extra_data_len.unwrap_or(0);
    if extra_data_len > defaults::MAX_EXTRADATA_LEN {
        return Err(ConfigError::ExtraDataTooLong { max: defaults::MAX_EXTRADATA_LEN, got: extra_data_len });
    }

    let message_source = if let Some(fixed) = &cli.fixed_message {
        MessageSource::Fixed(fixed.clone())
    } else if let Some(path) = &cli.data_file {
        MessageSource::DataFile {
            path: path.clone(),
            binary: cli.binary_file,
            iterations: cli.iterations.unwrap_or(1),
        }
    } else {
        MessageSource::Generated {
            extra_data_len,
            randomize_extra: cli.randomize_extra,
            dynafile_range: cli.dynafile_range,
            rfc5424: cli.rfc5424,
            json_cookie: cli.json_cookie.clone(),
        }
    };

    let tls = TlsConfig {
        ca_file: cli.tls_ca.clone().or(file.tls_ca),
        cert_file: cli.tls_cert.clone().or(file.tls_cert),
        key_file: cli.tls_key.clone().or(file.tls_key),
        log_level: cli.tls_log_level.unwrap_or(0),
        custom: cli
            .tls_custom_config
            .iter()
            .filter_map(|kv| kv.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())))
            .collect(),
    };

    let relp = RelpConfig {
        auth_mode: cli.relp_auth_mode.clone(),
        permitted_peer: cli.relp_permitted_peer.clone(),
    };

    let generator = GeneratorConfig {
        target,
        ports,
        num_ports,
        connections: cli.connections.or(file.connections).unwrap_or(1),
        messages: cli.messages.unwrap_or(1),
        start_msg_num: cli.start_msg_num.unwrap_or(0),
        pri: cli.pri.clone().or(file.pri.clone()).unwrap_or_else(|| defaults::pri().to_string()),
        hostname: cli.hostname.clone().or(file.hostname.clone()).unwrap_or_else(|| defaults::hostname().to_string()),
        frame_delim: cli.frame_delim.unwrap_or_else(defaults::frame_delim),
        octet_count_framed: cli.octet_count_framed,
        message_source,
        drop_connections: cli.drop_connections,
        drop_probability: cli.drop_probability.unwrap_or_else(defaults::drop_probability),
        transport,
        tls,
        relp,
        batch_size: cli.batch_size.unwrap_or_else(defaults::batch_size),
        wait_time: Duration::from_micros(cli.wait_time_us.unwrap_or(0)),
        multithreaded: cli.multithreaded,
        opener_threads: cli.opener_threads.or(file.opener_threads).unwrap_or_else(defaults::opener_threads),
        no_abort_on_send_fail: cli.no_abort_on_send_fail,
        silent: cli.silent,
        verbose: cli.verbose,
    };

    let file_sleep_between_runs = file.sleep_between_runs;
    Ok(RunParams {
        runs: cli.runs.or(file.runs).unwrap_or_else(defaults::num_runs),
        sleep_between_runs: Duration::from_secs(cli.sleep_between_runs.unwrap_or_else(|| {
            file_sleep_between_runs.unwrap_or_else(defaults::sleep_between_runs).as_secs()
        })),
        emit_stats: cli.stats,
        csv: cli.csv,
        generator,
    })
}
