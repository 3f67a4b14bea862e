//! Packet formatter: reinterprets a burst payload as interleaved complex64
//! (float32 I + float32 Q) samples (spec §4.2).

use crate::ingest::Burst;
use log::info;
use num_complex::Complex32;
use std::time::Instant;

/// Wideband complex baseband frame at the sensor's input sample rate.
#[derive(Debug, Clone)]
pub struct IqFrame {
    pub samples: Vec<Complex32>,
    pub sample_rate_hz: f64,
}

pub struct PacketFormatter {
    sample_rate_hz: f64,
    log_period: std::time::Duration,
    last_log: Instant,
    bytes_since_log: u64,
}

impl PacketFormatter {
    pub fn new(sample_rate_hz: f64, log_period_secs: f64) -> Self {
        Self {
            sample_rate_hz,
            log_period: std::time::Duration::from_secs_f64(log_period_secs.max(0.001)),
            last_log: Instant::now(),
            bytes_since_log: 0,
        }
    }

    /// Converts a burst's little-endian interleaved f32 I/Q payload into an
    /// `IqFrame`. Trailing bytes that don't form a full complex sample pair
    /// (8 bytes) are dropped.
    pub fn compute(&mut self, burst: &Burst) -> IqFrame {
        let usable = burst.payload.len() - (burst.payload.len() % 8);
        let mut samples = Vec::with_capacity(usable / 8);
        let mut i = 0;
        while i < usable {
            let re = f32::from_le_bytes(burst.payload[i..i + 4].try_into().unwrap());
            let im = f32::from_le_bytes(burst.payload[i + 4..i + 8].try_into().unwrap());
            samples.push(Complex32::new(re, im));
            i += 8;
        }

        self.bytes_since_log += burst.payload.len() as u64;
        if self.last_log.elapsed() >= self.log_period {
            let mbps = (self.bytes_since_log as f64 * 8.0 / 1e6) / self.last_log.elapsed().as_secs_f64();
            info!("pkt_format: ingest bandwidth {mbps:.2} Mbps over last {:.1}s", self.last_log.elapsed().as_secs_f64());
            self.bytes_since_log = 0;
            self.last_log = Instant::now();
        }

        IqFrame {
            samples,
            sample_rate_hz: self.sample_rate_hz,
        }
    }
}
