//! UDP "connection": a single outbound socket shared by the whole fleet, since UDP has no
//! per-connection state to open or close.

use std::net::{SocketAddr, UdpSocket};

use crate::error::{FleetError, SendError};

#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    pub fn bind(target: SocketAddr) -> Result<Self, FleetError> {
        let local: SocketAddr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" }.parse().unwrap();
        let socket = UdpSocket::bind(local)?;
        Ok(UdpTransport { socket, target })
    }

    pub fn send(&self, buf: &[u8]) -> Result<(), SendError> {
        let n = self.socket.send_to(buf, self.target)?;
        if n != buf.len() {
            return Err(SendError::ClosedRemotely);
        }
        Ok(())
    }
}
