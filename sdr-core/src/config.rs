//! Typed configuration for the SDR pipeline.
//!
//! `sdr-core` owns only the typed structures and their invariant checks;
//! YAML parsing and environment variable overrides live in `sdr-cli::config`.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum L4Proto {
    #[default]
    Udp,
    Tcp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub sample_rate: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRxConfig {
    pub ip_addr: String,
    pub dst_port: u16,
    pub l4_proto: L4Proto,
    pub batch_size: usize,
    pub header_bytes: usize,
    pub max_payload_size: usize,
}

impl Default for NetworkRxConfig {
    fn default() -> Self {
        Self {
            ip_addr: "0.0.0.0".to_string(),
            dst_port: 5000,
            l4_proto: L4Proto::Udp,
            batch_size: 65536,
            header_bytes: 8,
            max_payload_size: 1472,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PktFormatConfig {
    pub log_period: f64,
}

impl Default for PktFormatConfig {
    fn default() -> Self {
        Self { log_period: 5.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelizerConfig {
    pub num_channels: usize,
    pub channel_spacing: f64,
}

impl Default for ChannelizerConfig {
    fn default() -> Self {
        Self {
            num_channels: 1,
            channel_spacing: 200_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowPassFilterConfig {
    pub cutoff: f64,
    pub numtaps: usize,
}

impl Default for LowPassFilterConfig {
    fn default() -> Self {
        Self {
            cutoff: 100_000.0,
            numtaps: 101,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleConfig {
    pub sample_rate_out: f64,
    pub gain: f32,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            sample_rate_out: 16_000.0,
            gain: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RivaConfig {
    pub src_lang_code: String,
    pub automatic_punctuation: bool,
    pub verbatim_transcripts: bool,
    pub sample_rate: u32,
    pub min_db_export_chars: usize,
    pub db_export_timeout_sec: f64,
}

impl Default for RivaConfig {
    fn default() -> Self {
        Self {
            src_lang_code: "en-US".to_string(),
            automatic_punctuation: true,
            verbatim_transcripts: false,
            sample_rate: 16_000,
            min_db_export_chars: 400,
            db_export_timeout_sec: 30.0,
        }
    }
}

/// Top-level configuration bundle, mirrors the YAML document of the external
/// contract one-to-one (§6). `sdr-cli` deserializes this directly from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub network_rx: NetworkRxConfig,
    #[serde(default)]
    pub pkt_format: PktFormatConfig,
    #[serde(default)]
    pub channelizer: ChannelizerConfig,
    #[serde(default)]
    pub lowpassfilt: LowPassFilterConfig,
    #[serde(default)]
    pub resample: ResampleConfig,
    #[serde(default)]
    pub riva: RivaConfig,
}

impl AppConfig {
    /// Checks the bandwidth guard and resampler rate invariants from spec §3.
    /// Fatal at startup: a failure here means the pipeline cannot run safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate {
                rate: self.sensor.sample_rate,
            });
        }

        let n = self.channelizer.num_channels as f64;
        let used_hz = (n - 1.0) * self.channelizer.channel_spacing + self.lowpassfilt.cutoff;
        let nyquist_hz = self.sensor.sample_rate / 2.0;
        if used_hz > nyquist_hz {
            return Err(ConfigError::BandwidthGuardViolated {
                spacing_hz: self.channelizer.channel_spacing,
                channel_bw_hz: self.lowpassfilt.cutoff,
                used_hz,
                nyquist_hz,
            });
        }

        let (fs_big, fs_small) = if self.sensor.sample_rate > self.resample.sample_rate_out {
            (self.sensor.sample_rate, self.resample.sample_rate_out)
        } else {
            (self.resample.sample_rate_out, self.sensor.sample_rate)
        };
        const MAX_UP: u32 = 1;
        const MAX_RATE_HZ: f64 = 10_000_000.0;
        if (MAX_UP as f64) * fs_small > MAX_RATE_HZ && fs_big > fs_small {
            return Err(ConfigError::InvalidResampler {
                reason: format!(
                    "up({MAX_UP}) * fs_small({fs_small}) exceeds the 10 MHz resampler ceiling"
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bandwidth_guard_rejects_tight_spacing() {
        let mut cfg = AppConfig::default();
        cfg.channelizer.num_channels = 8;
        cfg.channelizer.channel_spacing = 200_000.0;
        cfg.sensor.sample_rate = 1_000_000.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::BandwidthGuardViolated { .. })
        ));
    }

    #[test]
    fn bandwidth_guard_accepts_wider_rate() {
        let mut cfg = AppConfig::default();
        cfg.channelizer.num_channels = 8;
        cfg.channelizer.channel_spacing = 200_000.0;
        cfg.sensor.sample_rate = 4_000_000.0;
        assert!(cfg.validate().is_ok());
    }
}
