//! Hamming-window low-pass FIR design and direct-form application
//! (spec §4.4).

use crate::errors::DspError;
use num_complex::Complex32;
use std::f64::consts::PI;

/// Designs a `numtaps`-tap low-pass FIR with a Hamming window, cutoff at
/// `cutoff_hz` for signals sampled at `fs_hz`. Normalized to unity DC gain.
pub fn design_lowpass_hamming(numtaps: usize, cutoff_hz: f64, fs_hz: f64) -> Result<Vec<f32>, DspError> {
    if numtaps == 0 {
        return Err(DspError::FilterDesignFailed {
            reason: "numtaps must be > 0".to_string(),
        });
    }
    if cutoff_hz <= 0.0 || fs_hz <= 0.0 || cutoff_hz >= fs_hz / 2.0 {
        return Err(DspError::FilterDesignFailed {
            reason: format!("cutoff {cutoff_hz} Hz must be in (0, fs/2={}) Hz", fs_hz / 2.0),
        });
    }

    let fc = cutoff_hz / fs_hz; // normalized cutoff, cycles/sample
    let m = numtaps as f64 - 1.0;
    let mut taps = vec![0.0f64; numtaps];

    for (i, tap) in taps.iter_mut().enumerate() {
        let n = i as f64 - m / 2.0;
        let sinc = if n.abs() < 1e-12 {
            2.0 * fc
        } else {
            (2.0 * PI * fc * n).sin() / (PI * n)
        };
        let window = 0.54 - 0.46 * (2.0 * PI * i as f64 / m).cos();
        *tap = sinc * window;
    }

    let dc_gain: f64 = taps.iter().sum();
    if dc_gain.abs() > 1e-12 {
        for tap in &mut taps {
            *tap /= dc_gain;
        }
    }

    Ok(taps.into_iter().map(|t| t as f32).collect())
}

/// Direct-form FIR (`a = [1]`) applied to a complex signal, zero-padded at
/// the boundaries.
pub fn apply_fir(taps: &[f32], signal: &[Complex32]) -> Vec<Complex32> {
    let mut output = vec![Complex32::new(0.0, 0.0); signal.len()];
    for (n, out) in output.iter_mut().enumerate() {
        let mut acc = Complex32::new(0.0, 0.0);
        for (j, &h) in taps.iter().enumerate() {
            if n >= j {
                acc += signal[n - j] * h;
            }
        }
        *out = acc;
    }
    output
}
