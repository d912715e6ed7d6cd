//! TCP+TLS connection slot with the same send-buffer coalescing the original tool used to
//! avoid issuing one TLS record per tiny syslog message: writes accumulate in `send_buf`
//! until the next one would overflow [`defaults::MAX_SENDBUF`], at which point the buffer
//! is flushed in a single `SSL_write`.

use std::io::Write;
use std::net::SocketAddr;

use openssl::ssl::{Ssl, SslConnector, SslMethod, SslStream};

use crate::config::TlsConfig;
use crate::defaults;
use crate::error::{FleetError, SendError};
use crate::timeout;
use crate::transport::pem;

#[derive(Debug)]
pub struct TlsSlot {
    stream: SslStream<std::net::TcpStream>,
    send_buf: Vec<u8>,
}

impl TlsSlot {
    pub fn connect(addr: SocketAddr, tls: &TlsConfig) -> Result<Self, FleetError> {
        let connector = build_connector(SslMethod::tls(), tls)?;
        let tcp = timeout::connect_with_retry(|| std::net::TcpStream::connect(addr)).map_err(|source| {
            FleetError::ConnectFailed { addr: addr.to_string(), retries: defaults::connect_retries(), source }
        })?;
        tcp.set_nodelay(true).ok();

        let ssl = Ssl::new(connector.context())
            .map_err(|e| FleetError::HandshakeFailed { addr: addr.to_string(), reason: e.to_string() })?;
        let stream = ssl
            .connect(tcp)
            .map_err(|e| FleetError::HandshakeFailed { addr: addr.to_string(), reason: e.to_string() })?;

        Ok(TlsSlot { stream, send_buf: Vec::with_capacity(defaults::MAX_SENDBUF) })
    }

    pub fn send(&mut self, buf: &[u8]) -> Result<(), SendError> {
        if self.send_buf.len() + buf.len() < defaults::MAX_SENDBUF {
            self.send_buf.extend_from_slice(buf);
            Ok(())
        } else {
            self.flush_buf()?;
            self.send_buf.extend_from_slice(buf);
            Ok(())
        }
    }

    pub fn flush(&mut self) -> Result<(), SendError> {
        self.flush_buf()
    }

    fn flush_buf(&mut self) -> Result<(), SendError> {
        if self.send_buf.is_empty() {
            return Ok(());
        }
        self.stream.write_all(&self.send_buf)?;
        self.send_buf.clear();
        Ok(())
    }

    pub fn close(mut self) {
        let _ = self.flush_buf();
        let _ = self.stream.shutdown();
    }
}

/// Builds a connector for `method` (`SslMethod::tls()` or `SslMethod::dtls()`), so TLS and
/// DTLS slots can share the same CA/cert/key/custom-config wiring.
pub fn build_connector(method: SslMethod, tls: &TlsConfig) -> Result<SslConnector, FleetError> {
    pem::build_connector(
        method,
        tls.ca_file.as_deref(),
        tls.cert_file.as_deref(),
        tls.key_file.as_deref(),
        &tls.custom,
    )
    .map_err(|e| FleetError::HandshakeFailed { addr: "tls-connector".to_string(), reason: e.to_string() })
}
