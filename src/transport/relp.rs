//! A minimal RELP client, implementing just enough of the protocol (RFC-less, but codified
//! by the reference `librelp` wire format) to drive a syslog receiver: `open`, `syslog`, and
//! `close` commands framed as `txnr command datalen data\n`.
//!
//! RELP is treated as an opaque capability at the interface level (spec): callers only ever
//! see [`RelpSlot::connect`]/[`send`]/[`close`], never the frame format itself.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::config::{RelpConfig, TlsConfig};
use crate::error::{FleetError, SendError};
use crate::timeout;
use crate::transport::tls;

#[derive(Debug)]
enum Wire {
    Plain(TcpStream),
    Tls(openssl::ssl::SslStream<TcpStream>),
}

impl Read for Wire {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Wire::Plain(s) => s.read(buf),
            Wire::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Wire {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Wire::Plain(s) => s.write(buf),
            Wire::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Wire::Plain(s) => s.flush(),
            Wire::Tls(s) => s.flush(),
        }
    }
}

#[derive(Debug)]
pub struct RelpSlot {
    reader: BufReader<Wire>,
    txnr: u32,
}

impl RelpSlot {
    pub fn connect(
        addr: SocketAddr,
        use_tls: bool,
        tls_cfg: &TlsConfig,
        relp_cfg: &RelpConfig,
    ) -> Result<Self, FleetError> {
        let tcp = timeout::connect_with_retry(|| TcpStream::connect(addr)).map_err(|source| {
            FleetError::ConnectFailed { addr: addr.to_string(), retries: crate::defaults::connect_retries(), source }
        })?;
        tcp.set_read_timeout(Some(timeout::relp_deadline())).ok();

        // CA/cert/key and custom TLS config are baked into the connector and applied during
        // the handshake below, which necessarily completes before any RELP frame is
        // exchanged; auth-mode and permitted-peer are RELP-protocol-level settings, so they
        // are applied next, during the `open` negotiation in `open_session`.
        let wire = if use_tls {
            let connector = tls::build_connector(openssl::ssl::SslMethod::tls(), tls_cfg)?;
            let ssl = openssl::ssl::Ssl::new(connector.context())
                .map_err(|e| FleetError::HandshakeFailed { addr: addr.to_string(), reason: e.to_string() })?;
            let stream = ssl
                .connect(tcp)
                .map_err(|e| FleetError::HandshakeFailed { addr: addr.to_string(), reason: e.to_string() })?;
            Wire::Tls(stream)
        } else {
            Wire::Plain(tcp)
        };

        let mut slot = RelpSlot { reader: BufReader::new(wire), txnr: 1 };
        slot.open_session(addr, relp_cfg)?;
        Ok(slot)
    }

    fn open_session(&mut self, addr: SocketAddr, relp_cfg: &RelpConfig) -> Result<(), FleetError> {
        let mut offer = String::from("relp_version=0\nrelp_software=syslog-flood\ncommands=syslog");
        if let Some(auth_mode) = &relp_cfg.auth_mode {
            tracing::debug!(auth_mode = %auth_mode, "applying RELP auth mode");
            offer.push_str(&format!("\nauth_mode={auth_mode}"));
        }
        if let Some(peer) = &relp_cfg.permitted_peer {
            tracing::debug!(permitted_peer = %peer, "applying RELP permitted peer");
            offer.push_str(&format!("\npermitted_peer={peer}"));
        }
        self.write_frame("open", offer.as_bytes())
            .map_err(|e| FleetError::RelpConnectFailed { addr: addr.to_string(), reason: e.to_string() })?;
        let code = self
            .read_response_code()
            .map_err(|e| FleetError::RelpConnectFailed { addr: addr.to_string(), reason: e.to_string() })?;
        if code != 200 {
            return Err(FleetError::RelpConnectFailed {
                addr: addr.to_string(),
                reason: format!("peer rejected open with response code {code}"),
            });
        }
        Ok(())
    }

    fn write_frame(&mut self, command: &str, data: &[u8]) -> std::io::Result<()> {
        let header = format!("{} {} {} ", self.txnr, command, data.len());
        let wire = self.reader.get_mut();
        wire.write_all(header.as_bytes())?;
        wire.write_all(data)?;
        wire.write_all(b"\n")?;
        self.txnr = self.txnr.wrapping_add(1);
        Ok(())
    }

    /// Reads one `txnr rsp datalen <code> ...\n` response line and returns the numeric
    /// response code (200 for OK, librelp's error codes otherwise). Returns `-1` if the
    /// peer's response doesn't carry a parseable code, which callers treat as a failure.
    fn read_response_code(&mut self) -> std::io::Result<i32> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "RELP peer closed connection"));
        }
        Ok(line.split_whitespace().nth(3).and_then(|c| c.parse::<i32>().ok()).unwrap_or(-1))
    }

    pub fn send(&mut self, buf: &[u8]) -> Result<(), SendError> {
        self.write_frame("syslog", buf)?;
        let code = self.read_response_code()?;
        if code != 200 {
            tracing::warn!(code, "RELP server rejected a syslog frame");
            return Err(SendError::RelpFailed(code));
        }
        Ok(())
    }

    pub fn close(mut self) {
        let _ = self.write_frame("close", b"");
        if let Wire::Tls(s) = self.reader.get_mut() {
            let _ = s.shutdown();
        }
    }
}

pub fn connect_timeout() -> Duration {
    timeout::relp_deadline()
}
