//! Burst accumulation: drains a socket until `batch_size` payload bytes have
//! been collected (headers stripped per read), then emits one `Burst`.

use super::socket::BurstSocket;
use crate::config::NetworkRxConfig;
use log::{error, warn};

/// One batched reassembly unit: `header` carries the opaque sequence bytes
/// stripped from the most recent read (diagnostic only), `payload` is the
/// concatenation of header-stripped datagram/read bodies.
#[derive(Debug, Clone, Default)]
pub struct Burst {
    pub header: Vec<u8>,
    pub payload: Vec<u8>,
}

pub struct BurstReader {
    socket: Option<BurstSocket>,
    header_bytes: usize,
    batch_size: usize,
    max_payload_size: usize,
    accumulator: Vec<u8>,
    last_header: Vec<u8>,
}

impl BurstReader {
    pub fn new(cfg: &NetworkRxConfig) -> Self {
        let socket = match BurstSocket::bind(cfg.l4_proto, &cfg.ip_addr, cfg.dst_port) {
            Ok(s) => Some(s),
            Err(e) => {
                error!("ingest: socket creation failed, operator becomes a no-op: {e}");
                None
            }
        };
        Self {
            socket,
            header_bytes: cfg.header_bytes,
            batch_size: cfg.batch_size,
            max_payload_size: cfg.max_payload_size,
            accumulator: Vec::with_capacity(cfg.batch_size),
            last_header: Vec::new(),
        }
    }

    /// Drains the socket until `batch_size` bytes of payload have
    /// accumulated, or the socket would block with nothing yet
    /// accumulated (in which case this tick emits nothing).
    pub fn compute(&mut self) -> Option<Burst> {
        let socket = self.socket.as_ref()?;
        let mut buf = vec![0u8; self.header_bytes + self.max_payload_size];

        loop {
            match socket.recv(&mut buf) {
                Ok(Some(n)) => {
                    if n < self.header_bytes {
                        warn!("ingest: read {n} bytes shorter than header_bytes={}, dropping partial burst", self.header_bytes);
                        self.accumulator.clear();
                        continue;
                    }
                    self.last_header = buf[..self.header_bytes].to_vec();
                    self.accumulator.extend_from_slice(&buf[self.header_bytes..n]);
                    if self.accumulator.len() >= self.batch_size {
                        return Some(self.take_burst());
                    }
                }
                Ok(None) => {
                    // Would-block this tick; partial accumulation carries to the next tick.
                    return None;
                }
                Err(e) => {
                    error!("ingest: read error, dropping partial burst: {e}");
                    self.accumulator.clear();
                    return None;
                }
            }
        }
    }

    fn take_burst(&mut self) -> Burst {
        Burst {
            header: std::mem::take(&mut self.last_header),
            payload: std::mem::take(&mut self.accumulator),
        }
    }
}

impl std::fmt::Debug for BurstReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BurstReader")
            .field("header_bytes", &self.header_bytes)
            .field("batch_size", &self.batch_size)
            .field("accumulated", &self.accumulator.len())
            .finish()
    }
}
