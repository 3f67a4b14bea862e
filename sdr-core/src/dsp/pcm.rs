//! Float-to-PCM16 conversion and per-channel buffering onto a bounded FIFO
//! (spec §4.4).

use crossbeam_channel::Sender;
use log::{info, warn};

/// One second of 16 kHz mono 16-bit PCM: `2 * 16000` bytes.
pub const BUFFER_LIMIT_BYTES: usize = 2 * 16_000;

#[derive(Debug, Clone)]
pub struct PcmChunk {
    pub bytes: Vec<u8>,
    pub channel_id: usize,
}

/// Clip-and-scale float audio to little-endian i16 PCM bytes. Scales by
/// `2^15`, not `i16::MAX`, so that `f <= -1.0` clips to exactly `i16::MIN`.
pub fn float_to_pcm16(samples: &[f32]) -> Vec<u8> {
    const SCALE: f32 = 32_768.0;
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let scaled = s * SCALE;
        let clipped = scaled.clamp(i16::MIN as f32, i16::MAX as f32);
        out.extend_from_slice(&(clipped as i16).to_le_bytes());
    }
    out
}

/// Accumulates PCM bytes until [`BUFFER_LIMIT_BYTES`] is reached, then
/// pushes one chunk onto the channel's FIFO. Queue-depth is observational
/// only: it logs at depth > 5, warns at depth > 10, and never drops data.
pub struct PcmPacker {
    channel_id: usize,
    accumulator: Vec<u8>,
    fifo: Sender<PcmChunk>,
}

impl PcmPacker {
    pub fn new(channel_id: usize, fifo: Sender<PcmChunk>) -> Self {
        Self {
            channel_id,
            accumulator: Vec::with_capacity(BUFFER_LIMIT_BYTES),
            fifo,
        }
    }

    pub fn push_audio(&mut self, samples: &[f32]) {
        self.accumulator.extend_from_slice(&float_to_pcm16(samples));
        while self.accumulator.len() >= BUFFER_LIMIT_BYTES {
            let chunk_bytes = self.accumulator.drain(..BUFFER_LIMIT_BYTES).collect();
            let chunk = PcmChunk {
                bytes: chunk_bytes,
                channel_id: self.channel_id,
            };
            // try_send is non-blocking; FIFOs are effectively unbounded in
            // capacity per spec §5, so this should never actually reject.
            let _ = self.fifo.try_send(chunk);

            let depth = self.fifo.len();
            if depth > 10 {
                warn!("pcm: channel {} FIFO depth {depth} (>10)", self.channel_id);
            } else if depth > 5 {
                info!("pcm: channel {} FIFO depth {depth} (>5)", self.channel_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn clips_symmetrically_at_unity_magnitude() {
        let bytes = float_to_pcm16(&[1.5, -1.5, 0.0]);
        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(samples, vec![i16::MAX, i16::MIN, 0]);
    }

    #[test]
    fn negative_unity_maps_to_exactly_int16_min() {
        let bytes = float_to_pcm16(&[-1.0]);
        let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
        assert_eq!(sample, i16::MIN);
    }

    #[test]
    fn never_enqueues_below_buffer_limit() {
        let (tx, rx) = unbounded();
        let mut packer = PcmPacker::new(0, tx);
        packer.push_audio(&vec![0.1f32; 100]);
        assert!(rx.try_recv().is_err(), "100 samples (200 bytes) is far below the 32000-byte threshold");
    }

    #[test]
    fn enqueues_exactly_at_threshold() {
        let (tx, rx) = unbounded();
        let mut packer = PcmPacker::new(3, tx);
        let samples = vec![0.5f32; BUFFER_LIMIT_BYTES / 2];
        packer.push_audio(&samples);
        let chunk = rx.try_recv().expect("one chunk should be emitted");
        assert_eq!(chunk.bytes.len(), BUFFER_LIMIT_BYTES);
        assert_eq!(chunk.channel_id, 3);
    }
}
