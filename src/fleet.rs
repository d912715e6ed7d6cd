//! Opens and tears down the connection fleet, and raises the process's descriptor limit
//! when the requested connection count calls for it.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::config::{GeneratorConfig, TransportKind};
use crate::defaults;
use crate::error::FleetError;
use crate::transport::{
    self, dtls::DtlsConnection, dtls::DtlsSlot, relp::RelpSlot, tcp::TcpSlot, tls::TlsSlot, udp::UdpTransport,
    ConnectionSlot, SlotState,
};

/// Reads the process's current `RLIMIT_NOFILE` soft limit.
pub fn soft_fd_limit() -> std::io::Result<u64> {
    unsafe {
        let mut limit = std::mem::zeroed::<libc::rlimit>();
        if libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(limit.rlim_cur as u64)
    }
}

/// Raises `RLIMIT_NOFILE` to `connections + headroom`, matching the original's behavior of
/// only bothering once the connection count exceeds [`defaults::DESCRIPTOR_RAISE_THRESHOLD`].
pub fn raise_fd_limit_if_needed(connections: u64) -> Result<(), FleetError> {
    if connections <= defaults::DESCRIPTOR_RAISE_THRESHOLD {
        return Ok(());
    }
    let requested = connections + defaults::DESCRIPTOR_HEADROOM;
    unsafe {
        let limit = libc::rlimit { rlim_cur: requested, rlim_max: requested };
        if libc::setrlimit(libc::RLIMIT_NOFILE, &limit) != 0 {
            return Err(FleetError::DescriptorLimit { requested, source: std::io::Error::last_os_error() });
        }
    }
    Ok(())
}

/// Resolves the requested connection count against the OS descriptor limit, gracefully
/// degrading to whatever fits when `soft_limit` is set (the negative-`-c` behavior).
pub fn resolve_connection_count(requested: i64, soft_limit: bool) -> Result<u64, FleetError> {
    let requested = requested.unsigned_abs();
    let os_max = soft_fd_limit()?;
    if requested > os_max.saturating_sub(defaults::DESCRIPTOR_HEADROOM) {
        if soft_limit {
            let reduced = os_max.saturating_sub(defaults::DESCRIPTOR_HEADROOM);
            tracing::warn!(requested, reduced, "reducing connection count to fit descriptor limit");
            Ok(reduced.max(1))
        } else {
            Err(FleetError::DescriptorLimitExceeded { requested, limit: os_max })
        }
    } else {
        Ok(requested)
    }
}

fn resolve_target(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address found for host"))
}

/// The open connection fleet plus the shared UDP socket, when the transport is UDP.
#[derive(Debug)]
pub struct Fleet {
    pub slots: Vec<Mutex<ConnectionSlot>>,
    pub udp: Option<UdpTransport>,
}

impl Fleet {
    /// Opens `count` connections (or one UDP socket, regardless of `count`) using
    /// `opener_threads` worker threads, matching `openConnections`/`connectionWorker`.
    pub fn open(cfg: &Arc<GeneratorConfig>, count: u64) -> Result<Fleet, FleetError> {
        if cfg.transport == TransportKind::Udp {
            let port = transport::pick_port(cfg);
            let addr = resolve_target(&cfg.target, port)?;
            return Ok(Fleet { slots: Vec::new(), udp: Some(UdpTransport::bind(addr)?) });
        }

        if cfg.transport == TransportKind::Dtls {
            let port = transport::pick_port(cfg);
            let addr = resolve_target(&cfg.target, port)?;
            let conn = DtlsConnection::bind(addr, cfg.tls.clone())?;
            let slot = Mutex::new(ConnectionSlot { index: 0, state: SlotState::Dtls(conn) });
            return Ok(Fleet { slots: vec![slot], udp: None });
        }

        let thread_count = (cfg.opener_threads as u64).min(count).max(1) as usize;
        let per_thread = count / thread_count as u64;
        let remainder = count % thread_count as u64;

        let mut handles = Vec::with_capacity(thread_count);
        let mut start = 0u64;
        for t in 0..thread_count {
            let mut end = start + per_thread - 1;
            if t == 0 {
                end += remainder;
            }
            let cfg = Arc::clone(cfg);
            handles.push(
                thread::Builder::new()
                    .stack_size(defaults::worker_stack_size())
                    .spawn(move || open_range(&cfg, start, end))
                    .expect("failed to spawn connection-opener thread"),
            );
            start = end + 1;
        }

        let mut opened: Vec<Option<SlotState>> = (0..count).map(|_| None).collect();
        let mut first_err = None;
        for h in handles {
            match h.join().expect("connection-opener thread panicked") {
                Ok(range) => {
                    for (index, state) in range {
                        opened[index] = Some(state);
                    }
                }
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }

        let slots = opened
            .into_iter()
            .enumerate()
            .map(|(i, state)| {
                Mutex::new(ConnectionSlot { index: i, state: state.unwrap_or(SlotState::Closed) })
            })
            .collect();
        Ok(Fleet { slots, udp: None })
    }

    pub fn close_all(&mut self) {
        for slot in &self.slots {
            let mut guard = slot.lock().unwrap();
            guard.close();
        }
    }
}

fn open_one(cfg: &GeneratorConfig, index: usize) -> Result<SlotState, FleetError> {
    let port = transport::pick_port(cfg);
    let addr = resolve_target(&cfg.target, port)?;
    let state = match cfg.transport {
        TransportKind::Tcp => SlotState::Tcp(TcpSlot::connect(addr)?),
        TransportKind::Tls => SlotState::Tls(Mutex::new(TlsSlot::connect(addr, &cfg.tls)?)),
        TransportKind::Dtls => SlotState::Dtls(DtlsConnection::Ready(DtlsSlot::connect(addr, &cfg.tls)?)),
        TransportKind::RelpPlain => SlotState::Relp(RelpSlot::connect(addr, false, &cfg.tls, &cfg.relp)?),
        TransportKind::RelpTls => SlotState::Relp(RelpSlot::connect(addr, true, &cfg.tls, &cfg.relp)?),
        TransportKind::Udp => unreachable!("UDP has no per-connection slots, index {index}"),
    };
    Ok(state)
}

fn open_range(cfg: &GeneratorConfig, start: u64, end: u64) -> Result<Vec<(usize, SlotState)>, FleetError> {
    let mut opened = Vec::with_capacity((end - start + 1) as usize);
    for i in start..=end {
        let state = open_one(cfg, i as usize)?;
        opened.push((i as usize, state));
        if !cfg.silent && i % 10 == 0 {
            tracing::info!(opened = i, "opening connections");
        }
    }
    Ok(opened)
}

/// Reopens a single dropped slot in place, used both for the `-D` drop/reopen cycle and for
/// lazily re-establishing a connection the receiver closed.
pub fn reopen_slot(cfg: &GeneratorConfig, slot: &mut ConnectionSlot) -> Result<(), FleetError> {
    slot.state = open_one(cfg, slot.index)?;
    Ok(())
}
