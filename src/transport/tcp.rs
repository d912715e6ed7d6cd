//! Plain TCP connection slot.

use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{FleetError, SendError};
use crate::timeout;

#[derive(Debug)]
pub struct TcpSlot {
    stream: TcpStream,
}

impl TcpSlot {
    pub fn connect(addr: SocketAddr) -> Result<Self, FleetError> {
        let stream = timeout::connect_with_retry(|| {
            let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
            socket.connect(&addr.into())?;
            Ok(socket.into())
        })
        .map_err(|source| FleetError::ConnectFailed {
            addr: addr.to_string(),
            retries: crate::defaults::connect_retries(),
            source,
        })?;
        stream.set_nodelay(true).ok();
        Ok(TcpSlot { stream })
    }

    pub fn send(&mut self, buf: &[u8]) -> Result<(), SendError> {
        self.stream.write_all(buf)?;
        Ok(())
    }

    pub fn close(self) {
        let socket = Socket::from(self.stream);
        let linger = Duration::from_secs(crate::defaults::linger_seconds() as u64);
        socket.set_linger(Some(linger)).ok();
    }
}
