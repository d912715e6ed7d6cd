//! Blocking-I/O timeout helpers.
//!
//! The original generator relies on per-call timeouts (RELP's 2-second protocol timeout,
//! DTLS's 3-second datagram receive timeout, TCP's 100ms/50-retry connect loop) rather than
//! any cooperative cancellation. These helpers keep that shape for synchronous sockets.

use std::io;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use crate::defaults;

/// Retries `connect` up to `defaults::connect_retries()` times, sleeping
/// `defaults::connect_retry_delay()` between attempts, matching spec §4.1/§7.
pub fn connect_with_retry<F>(mut connect: F) -> io::Result<TcpStream>
where
    F: FnMut() -> io::Result<TcpStream>,
{
    let mut attempt = 0;
    loop {
        match connect() {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                attempt += 1;
                if attempt > defaults::connect_retries() {
                    return Err(err);
                }
                tracing::warn!(attempt, error = %err, "connect failed, retrying");
                thread::sleep(defaults::connect_retry_delay());
            }
        }
    }
}

/// Applies the DTLS receive timeout (spec §5) to a UDP socket.
pub fn set_dtls_recv_timeout(socket: &std::net::UdpSocket) -> io::Result<()> {
    socket.set_read_timeout(Some(defaults::dtls_recv_timeout()))
}

/// A deadline-style helper for bounding the RELP handshake, since the RELP engine itself
/// is treated as an opaque capability (spec §1) that we drive with our own I/O timeouts.
pub fn relp_deadline() -> Duration {
    defaults::relp_connect_timeout()
}
