//! DTLS connection slot: an OpenSSL DTLS session layered over a connected UDP socket.
//!
//! Only one DTLS session is ever established per run (mirroring the original's single
//! shared `udpsockin`/`udpsockout` pair), so the fleet reserves exactly slot 0 for it. The
//! raw send/receive socket is bound and connected eagerly when the fleet opens (matching
//! `setupDTLS`), but the SSL/TLS handshake itself is deferred until the first message is
//! actually sent (matching `initDTLSSess`, which `sendMessages` calls lazily).

use std::io::{self, Read, Write};
use std::net::{SocketAddr, UdpSocket};

use openssl::ssl::{Ssl, SslMethod, SslStream};

use crate::config::TlsConfig;
use crate::defaults;
use crate::error::{FleetError, SendError};
use crate::timeout;
use crate::transport::tls;

/// Adapts a connected [`UdpSocket`] to `Read`/`Write` so OpenSSL can drive a DTLS session
/// over it exactly as it would over a `TcpStream`.
#[derive(Debug)]
struct ConnectedUdp(UdpSocket);

impl Read for ConnectedUdp {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.recv(buf)
    }
}

impl Write for ConnectedUdp {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.send(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct DtlsSlot {
    stream: SslStream<ConnectedUdp>,
}

impl DtlsSlot {
    /// Binds, connects, and handshakes in one shot. Used by [`crate::fleet::reopen_slot`]
    /// to recover a dropped DTLS session, where there's no benefit to deferring the
    /// handshake any further.
    pub fn connect(addr: SocketAddr, tls: &TlsConfig) -> Result<Self, FleetError> {
        let socket = bind_and_connect(addr)?;
        Self::handshake(socket, addr, tls)
    }

    fn handshake(socket: UdpSocket, addr: SocketAddr, tls: &TlsConfig) -> Result<Self, FleetError> {
        let connector = tls::build_connector(SslMethod::dtls(), tls)?;
        let ssl = Ssl::new(connector.context())
            .map_err(|e| FleetError::HandshakeFailed { addr: addr.to_string(), reason: e.to_string() })?;
        let stream = ssl
            .connect(ConnectedUdp(socket))
            .map_err(|e| FleetError::HandshakeFailed { addr: addr.to_string(), reason: format!("{:?}", e) })?;
        Ok(DtlsSlot { stream })
    }

    pub fn send(&mut self, buf: &[u8]) -> Result<(), SendError> {
        self.stream.write_all(buf)?;
        Ok(())
    }

    pub fn close(mut self) {
        let _ = self.stream.shutdown();
    }
}

fn bind_and_connect(addr: SocketAddr) -> io::Result<UdpSocket> {
    let local: SocketAddr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" }.parse().unwrap();
    let socket = UdpSocket::bind(local)?;
    socket.connect(addr)?;
    timeout::set_dtls_recv_timeout(&socket)?;
    Ok(socket)
}

/// A DTLS slot's lifecycle: the send/receive socket exists from fleet-open time, but the
/// handshake only happens the first time a message is actually sent on it.
#[derive(Debug)]
pub enum DtlsConnection {
    Pending { socket: UdpSocket, addr: SocketAddr, tls: TlsConfig },
    Ready(DtlsSlot),
    /// A prior handshake attempt failed; sends keep failing until the slot is reopened.
    Failed,
}

impl DtlsConnection {
    /// Reserves the socket for the single DTLS session (spec: "slot 0"), without
    /// handshaking yet.
    pub fn bind(addr: SocketAddr, tls: TlsConfig) -> Result<Self, FleetError> {
        let socket = bind_and_connect(addr)?;
        Ok(DtlsConnection::Pending { socket, addr, tls })
    }

    pub fn send(&mut self, buf: &[u8]) -> Result<(), SendError> {
        if matches!(self, DtlsConnection::Pending { .. }) {
            self.handshake_now();
        }
        match self {
            DtlsConnection::Ready(slot) => slot.send(buf),
            DtlsConnection::Pending { .. } => unreachable!("handshake_now always leaves Ready or Failed"),
            DtlsConnection::Failed => Err(SendError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "DTLS handshake previously failed; slot needs to be reopened",
            ))),
        }
    }

    fn handshake_now(&mut self) {
        let pending = std::mem::replace(self, DtlsConnection::Failed);
        *self = match pending {
            DtlsConnection::Pending { socket, addr, tls } => match DtlsSlot::handshake(socket, addr, &tls) {
                Ok(slot) => DtlsConnection::Ready(slot),
                Err(e) => {
                    tracing::error!(addr = %addr, error = %e, "lazy DTLS handshake failed");
                    DtlsConnection::Failed
                }
            },
            other => other,
        };
    }

    pub fn close(self) {
        if let DtlsConnection::Ready(slot) = self {
            slot.close();
        }
    }
}

pub fn max_rcv_buf() -> usize {
    defaults::MAX_RCVBUF
}
