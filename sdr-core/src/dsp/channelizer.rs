//! Channelizer: splits one wideband baseband frame into N narrowband
//! channels via a cached bank of complex-exponential frequency shifts
//! (spec §4.3).

use super::packet_formatter::IqFrame;
use crate::errors::ChannelizerError;
use log::info;
use ndarray::Array2;
use num_complex::Complex32;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Multi-channel shifted signal: `samples[n, k]` is sample `n` of channel `k`.
#[derive(Debug, Clone)]
pub struct ChannelizedFrame {
    pub samples: Array2<Complex32>,
    pub sample_rate_hz: f64,
    pub num_channels: usize,
}

pub struct Channelizer {
    num_channels: usize,
    channel_spacing_hz: f64,
    shifts: Array2<Complex32>,
    cached_sample_rate_hz: f64,
}

impl Channelizer {
    pub fn new(num_channels: usize, channel_spacing_hz: f64) -> Self {
        Self {
            num_channels,
            channel_spacing_hz,
            shifts: Array2::from_elem((0, num_channels), Complex32::new(0.0, 0.0)),
            cached_sample_rate_hz: 0.0,
        }
    }

    /// The symmetric per-channel frequency offsets `(k - (N-1)/2) * spacing`.
    pub fn channel_offsets_hz(&self) -> Vec<f64> {
        let n = self.num_channels as f64;
        (0..self.num_channels)
            .map(|k| (k as f64 - (n - 1.0) / 2.0) * self.channel_spacing_hz)
            .collect()
    }

    fn regenerate(&mut self, len: usize, sample_rate_hz: f64) {
        info!(
            "channelizer: regenerating shift table for {len} samples at {sample_rate_hz} Hz, {} channels",
            self.num_channels
        );
        let offsets = self.channel_offsets_hz();
        let mut table = Array2::from_elem((len, self.num_channels), Complex32::new(0.0, 0.0));
        table
            .axis_iter_mut(ndarray::Axis(1))
            .into_par_iter()
            .zip(offsets.par_iter())
            .for_each(|(mut column, &freq_hz)| {
                for (n, cell) in column.iter_mut().enumerate() {
                    let phase = -2.0 * PI * freq_hz * n as f64 / sample_rate_hz;
                    *cell = Complex32::new(phase.cos() as f32, phase.sin() as f32);
                }
            });
        self.shifts = table;
        self.cached_sample_rate_hz = sample_rate_hz;
    }

    /// Emits the 2-D channelized tensor for one input frame. The shift table
    /// is regenerated only when the sample rate changes or the cached table
    /// is shorter than the current frame; it is grown, never shrunk.
    pub fn process(&mut self, frame: &IqFrame) -> Result<ChannelizedFrame, ChannelizerError> {
        let len = frame.samples.len();
        if frame.sample_rate_hz != self.cached_sample_rate_hz || self.shifts.nrows() < len {
            self.regenerate(len.max(self.shifts.nrows()), frame.sample_rate_hz);
        }

        let mut out = Array2::from_elem((len, self.num_channels), Complex32::new(0.0, 0.0));
        for (n, &x) in frame.samples.iter().enumerate() {
            for k in 0..self.num_channels {
                out[[n, k]] = x * self.shifts[[n, k]];
            }
        }

        Ok(ChannelizedFrame {
            samples: out,
            sample_rate_hz: frame.sample_rate_hz,
            num_channels: self.num_channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_has_n_columns_centered_on_dc() {
        let mut chz = Channelizer::new(3, 200_000.0);
        assert_eq!(chz.channel_offsets_hz(), vec![-200_000.0, 0.0, 200_000.0]);

        let frame = IqFrame {
            samples: vec![Complex32::new(1.0, 0.0); 8],
            sample_rate_hz: 1_000_000.0,
        };
        let out = chz.process(&frame).unwrap();
        assert_eq!(out.samples.ncols(), 3);
        assert_eq!(out.samples.nrows(), 8);
    }

    #[test]
    fn dc_channel_passes_input_unshifted() {
        let mut chz = Channelizer::new(1, 200_000.0);
        let frame = IqFrame {
            samples: vec![Complex32::new(1.0, 0.5), Complex32::new(-1.0, 2.0)],
            sample_rate_hz: 1_000_000.0,
        };
        let out = chz.process(&frame).unwrap();
        for (n, &x) in frame.samples.iter().enumerate() {
            let diff = out.samples[[n, 0]] - x;
            assert!(diff.norm() < 1e-5);
        }
    }

    #[test]
    fn table_grows_but_is_not_regenerated_for_shorter_frames() {
        let mut chz = Channelizer::new(1, 200_000.0);
        let long = IqFrame {
            samples: vec![Complex32::new(1.0, 0.0); 16],
            sample_rate_hz: 1_000_000.0,
        };
        chz.process(&long).unwrap();
        assert_eq!(chz.shifts.nrows(), 16);

        let short = IqFrame {
            samples: vec![Complex32::new(1.0, 0.0); 4],
            sample_rate_hz: 1_000_000.0,
        };
        chz.process(&short).unwrap();
        assert_eq!(chz.shifts.nrows(), 16, "cache should not shrink");
    }
}
