//! Socket transport for the network ingest operator.
//!
//! Mirrors the sizing and non-blocking-via-timeout pattern of an RTP socket
//! wrapper: a large receive buffer plus a short read timeout stand in for
//! `MSG_DONTWAIT`, since `std::net` exposes no portable non-blocking receive
//! that also reports "would block" as a distinguishable, cheap poll.

use crate::config::L4Proto;
use crate::errors::IngestError;
use socket2::{Domain, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::time::Duration;

/// Receive buffer large enough to absorb a burst-rate producer without
/// packet loss between scheduler ticks (order 49 MB, per spec §4.1).
const RECV_BUFFER_BYTES: usize = 49 * 1024 * 1024;
const POLL_TIMEOUT: Duration = Duration::from_millis(10);

pub enum BurstSocket {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

impl BurstSocket {
    /// Binds (UDP) or accepts one connection (TCP) on `(ip_addr, port)`.
    pub fn bind(proto: L4Proto, ip_addr: &str, port: u16) -> Result<Self, IngestError> {
        let addr: SocketAddr = format!("{ip_addr}:{port}")
            .parse()
            .map_err(|e| IngestError::BindFailed {
                addr: format!("{ip_addr}:{port}"),
                reason: format!("{e}"),
            })?;

        match proto {
            L4Proto::Udp => {
                let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, None)
                    .map_err(|e| IngestError::SocketConfig { reason: e.to_string() })?;
                socket
                    .set_reuse_address(true)
                    .map_err(|e| IngestError::SocketConfig { reason: e.to_string() })?;
                socket
                    .set_recv_buffer_size(RECV_BUFFER_BYTES)
                    .map_err(|e| IngestError::SocketConfig { reason: e.to_string() })?;
                socket
                    .bind(&addr.into())
                    .map_err(|e| IngestError::BindFailed {
                        addr: addr.to_string(),
                        reason: e.to_string(),
                    })?;
                socket
                    .set_read_timeout(Some(POLL_TIMEOUT))
                    .map_err(|e| IngestError::SocketConfig { reason: e.to_string() })?;
                Ok(BurstSocket::Udp(socket.into()))
            }
            L4Proto::Tcp => {
                let listener = TcpListener::bind(addr).map_err(|e| IngestError::BindFailed {
                    addr: addr.to_string(),
                    reason: e.to_string(),
                })?;
                let (stream, _) = listener.accept().map_err(|e| IngestError::BindFailed {
                    addr: addr.to_string(),
                    reason: e.to_string(),
                })?;
                stream
                    .set_read_timeout(Some(POLL_TIMEOUT))
                    .map_err(|e| IngestError::SocketConfig { reason: e.to_string() })?;
                Ok(BurstSocket::Tcp(stream))
            }
        }
    }

    /// Reads one datagram (UDP) or up to `buf.len()` bytes (TCP).
    /// Returns `Ok(None)` on a timeout (no data available this tick).
    pub fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>, IngestError> {
        use std::io::Read;
        let result = match self {
            BurstSocket::Udp(s) => s.recv(buf),
            BurstSocket::Tcp(mut s) => Read::read(&mut s, buf),
        };
        match result {
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                Ok(None)
            }
            Err(e) => Err(IngestError::ReadFailed { reason: e.to_string() }),
        }
    }
}

impl std::fmt::Debug for BurstSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BurstSocket::Udp(_) => write!(f, "BurstSocket::Udp"),
            BurstSocket::Tcp(_) => write!(f, "BurstSocket::Tcp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udp_bind_and_loopback_recv() {
        let socket = BurstSocket::bind(L4Proto::Udp, "127.0.0.1", 0).unwrap();
        // Port 0 picks an ephemeral port; re-resolve it to send a datagram.
        let local_addr = match &socket {
            BurstSocket::Udp(s) => s.local_addr().unwrap(),
            _ => unreachable!(),
        };
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(&[1, 2, 3, 4], local_addr).unwrap();

        std::thread::sleep(Duration::from_millis(20));
        let mut buf = [0u8; 16];
        let n = socket.recv(&mut buf).unwrap();
        assert_eq!(n, Some(4));
        assert_eq!(&buf[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn udp_recv_times_out_without_data() {
        let socket = BurstSocket::bind(L4Proto::Udp, "127.0.0.1", 0).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(socket.recv(&mut buf).unwrap(), None);
    }
}
