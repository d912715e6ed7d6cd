//! The `Transport` trait and the five wire implementations that back it: UDP, TCP, TLS,
//! DTLS, and RELP (plain or TLS-wrapped).
//!
//! A [`ConnectionSlot`] owns exactly one open connection (or datagram destination, for UDP)
//! and knows how to send a message on it, close it, and report whether sending failed in a
//! way that means the slot needs to be reopened before the next send.

pub mod dtls;
pub mod pem;
pub mod relp;
pub mod tcp;
pub mod tls;
pub mod udp;

use std::sync::Mutex;

use crate::config::GeneratorConfig;
use crate::error::SendError;

/// One open (or dropped) connection in the fleet.
#[derive(Debug)]
pub struct ConnectionSlot {
    pub index: usize,
    pub state: SlotState,
}

/// Per-transport connection state. TLS carries its own coalescing buffer behind a mutex so
/// that single-thread fan-out mode can still coalesce small sends into fewer TLS records
/// without corrupting interleaved writers.
#[derive(Debug)]
pub enum SlotState {
    Closed,
    Udp,
    Tcp(tcp::TcpSlot),
    Tls(Mutex<tls::TlsSlot>),
    Dtls(dtls::DtlsConnection),
    Relp(relp::RelpSlot),
}

impl ConnectionSlot {
    pub fn closed(index: usize) -> Self {
        ConnectionSlot { index, state: SlotState::Closed }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SlotState::Closed | SlotState::Dtls(dtls::DtlsConnection::Failed))
    }

    /// Sends one already-framed message on this slot.
    pub fn send(&mut self, buf: &[u8]) -> Result<(), SendError> {
        match &mut self.state {
            SlotState::Closed => Err(SendError::SlotClosed),
            SlotState::Udp => Err(SendError::SlotClosed),
            SlotState::Tcp(slot) => slot.send(buf),
            SlotState::Tls(slot) => slot.lock().unwrap().send(buf),
            SlotState::Dtls(slot) => slot.send(buf),
            SlotState::Relp(slot) => slot.send(buf),
        }
    }

    /// Flushes any coalesced data still buffered for this slot (TLS only).
    pub fn flush(&mut self) -> Result<(), SendError> {
        if let SlotState::Tls(slot) = &mut self.state {
            slot.lock().unwrap().flush()
        } else {
            Ok(())
        }
    }

    /// Closes the underlying socket with the linger behavior the original tool used to
    /// avoid overrunning the receiver.
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.state, SlotState::Closed) {
            SlotState::Tcp(slot) => slot.close(),
            SlotState::Tls(slot) => slot.into_inner().unwrap().close(),
            SlotState::Dtls(conn) => conn.close(),
            SlotState::Relp(slot) => slot.close(),
            SlotState::Udp | SlotState::Closed => {}
        }
    }
}

/// Picks the target port for one connection attempt, matching the original: when more than
/// one port is configured, a port is chosen at random from the active set; otherwise the
/// sole configured port is used.
pub fn pick_port(cfg: &GeneratorConfig) -> u16 {
    let ports = cfg.active_ports();
    if ports.len() > 1 {
        crate::util::random_port(ports)
    } else {
        ports[0]
    }
}
