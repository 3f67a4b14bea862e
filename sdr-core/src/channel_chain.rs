//! Per-channel DSP chain: column-extract -> filter -> demod -> resample ->
//! pack (spec §4.4). One `ChannelChain` instance runs per `channel_index`.

use crate::config::{LowPassFilterConfig, ResampleConfig};
use crate::dsp::channelizer::ChannelizedFrame;
use crate::dsp::{demod, filters, pcm::PcmPacker, resample::ChannelResampler};
use crate::errors::ChannelizerError;
use log::error;

pub struct ChannelChain {
    channel_index: usize,
    taps: Vec<f32>,
    filter_fs_hz: f64,
    resampler: ChannelResampler,
    packer: PcmPacker,
}

impl ChannelChain {
    pub fn new(
        channel_index: usize,
        filter_cfg: &LowPassFilterConfig,
        resample_cfg: &ResampleConfig,
        input_fs_hz: f64,
        packer: PcmPacker,
    ) -> Self {
        let taps = filters::design_lowpass_hamming(filter_cfg.numtaps, filter_cfg.cutoff, input_fs_hz)
            .unwrap_or_else(|e| {
                error!("channel {channel_index}: filter design failed, passing through unfiltered: {e}");
                vec![1.0]
            });

        Self {
            channel_index,
            taps,
            filter_fs_hz: input_fs_hz,
            resampler: ChannelResampler::new(resample_cfg.sample_rate_out, resample_cfg.gain),
            packer,
        }
    }

    /// Extracts this chain's column, runs filter -> demod -> resample ->
    /// pack. Malformed input (out-of-range channel index, empty column)
    /// degrades to a logged no-op rather than propagating an error out of
    /// the graph.
    pub fn compute(&mut self, frame: &ChannelizedFrame) {
        if self.channel_index >= frame.num_channels {
            error!(
                "channel {}: index out of range for {}-channel frame, dropping tick",
                self.channel_index, frame.num_channels
            );
            return;
        }

        let column: Vec<num_complex::Complex32> = frame
            .samples
            .column(self.channel_index)
            .iter()
            .copied()
            .collect();

        if frame.sample_rate_hz != self.filter_fs_hz {
            // Rate changes are one-time reconfiguration per spec §4.4.
            self.filter_fs_hz = frame.sample_rate_hz;
        }

        let filtered = filters::apply_fir(&self.taps, &column);

        let audio = match demod::fm_demod(&filtered) {
            Ok(a) => a,
            Err(e) => {
                error!("channel {}: fm_demod failed, dropping tick: {e}", self.channel_index);
                return;
            }
        };

        let resampled = match self.resampler.process(&audio, frame.sample_rate_hz) {
            Ok(r) => r,
            Err(e) => {
                error!("channel {}: resample failed, dropping tick: {e}", self.channel_index);
                return;
            }
        };

        self.packer.push_audio(&resampled);
    }
}

/// Validates a channel index against the channelizer's channel count; used
/// by graph wiring at startup rather than per-tick.
pub fn validate_channel_index(index: usize, num_channels: usize) -> Result<(), ChannelizerError> {
    if index >= num_channels {
        return Err(ChannelizerError::ChannelOutOfRange {
            index,
            num_channels,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::channelizer::Channelizer;
    use crate::dsp::packet_formatter::IqFrame;
    use crossbeam_channel::unbounded;
    use num_complex::Complex32;

    #[test]
    fn out_of_range_channel_degrades_to_noop() {
        let (tx, _rx) = unbounded();
        let packer = PcmPacker::new(5, tx);
        let mut chain = ChannelChain::new(
            5,
            &LowPassFilterConfig::default(),
            &ResampleConfig::default(),
            1_000_000.0,
            packer,
        );
        let mut chz = Channelizer::new(1, 200_000.0);
        let frame = chz
            .process(&IqFrame {
                samples: vec![Complex32::new(1.0, 0.0); 16],
                sample_rate_hz: 1_000_000.0,
            })
            .unwrap();
        // Should not panic.
        chain.compute(&frame);
    }
}
