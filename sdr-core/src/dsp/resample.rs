//! Rational polyphase resampling to the ASR target rate (spec §4.4).

use crate::errors::DspError;
use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const MAX_UP: u32 = 1;
const MAX_RATE_HZ: f64 = 10_000_000.0;

/// Reduces `(numerator, denominator)` to an `(up, down)` pair with
/// `up <= max_up`. Errors (invalid-rate) when `max_up * numerator` would
/// exceed the 10 MHz resampler ceiling (spec §3/§8). `numerator` is always
/// the larger of the two rates at the real call site (`rebuild`), so this
/// is the check that actually bounds the sensor's input rate.
pub fn reduce_fraction(numerator: f64, denominator: f64, max_up: u32) -> Result<(u32, u32), DspError> {
    let product = max_up as f64 * numerator;
    if product > MAX_RATE_HZ {
        return Err(DspError::InvalidResampleRate {
            up: max_up,
            max_up,
            product,
        });
    }
    let down = (numerator / denominator).round() as u32;
    Ok((max_up, down.max(1)))
}

/// Polyphase rational resampler, rebuilt whenever the upstream sample rate
/// changes. The identity case (`up == down`) bypasses resampling entirely.
pub struct ChannelResampler {
    fs_in: f64,
    fs_out: f64,
    gain: f32,
    up: u32,
    down: u32,
    inner: Option<SincFixedIn<f32>>,
}

impl ChannelResampler {
    pub fn new(fs_out: f64, gain: f32) -> Self {
        Self {
            fs_in: 0.0,
            fs_out,
            gain,
            up: 1,
            down: 1,
            inner: None,
        }
    }

    fn rebuild(&mut self, fs_in: f64) -> Result<(), DspError> {
        let (big, small) = if fs_in > self.fs_out {
            (fs_in, self.fs_out)
        } else {
            (self.fs_out, fs_in)
        };
        let (up, down) = reduce_fraction(big, small, MAX_UP)?;
        self.up = up;
        self.down = down;
        self.fs_in = fs_in;

        if up == down {
            self.inner = None;
            return Ok(());
        }

        let params = SincInterpolationParameters {
            sinc_len: 128,
            f_cutoff: 0.925,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: WindowFunction::BlackmanHarris2,
        };
        let ratio = self.fs_out / fs_in;
        self.inner = Some(
            SincFixedIn::<f32>::new(ratio, 2.0, params, 1024, 1).map_err(|e| DspError::FilterDesignFailed {
                reason: format!("resampler construction failed: {e}"),
            })?,
        );
        Ok(())
    }

    /// Resamples one channel's audio to `fs_out`, applying `gain` to the
    /// output. Recomputes the (up, down) fraction and rebuilds the inner
    /// resampler whenever `fs_in` changes.
    pub fn process(&mut self, audio: &[f32], fs_in: f64) -> Result<Vec<f32>, DspError> {
        if fs_in != self.fs_in {
            self.rebuild(fs_in)?;
        }

        let resampled = match &mut self.inner {
            None => audio.to_vec(),
            Some(resampler) => {
                let chunk_size = resampler.input_frames_next();
                let mut out = Vec::with_capacity(audio.len());
                let mut offset = 0;
                while offset < audio.len() {
                    let end = (offset + chunk_size).min(audio.len());
                    let mut chunk = audio[offset..end].to_vec();
                    chunk.resize(chunk_size, 0.0);
                    let waves_in = vec![chunk];
                    let waves_out = resampler.process(&waves_in, None).map_err(|e| DspError::FilterDesignFailed {
                        reason: format!("resample failed: {e}"),
                    })?;
                    out.extend_from_slice(&waves_out[0]);
                    offset = end;
                }
                out
            }
        };

        Ok(resampled.into_iter().map(|s| s * self.gain).collect())
    }
}
