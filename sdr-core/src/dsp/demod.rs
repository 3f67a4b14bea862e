//! FM demodulation: discrete-time phase differentiator on the unwrapped
//! angle of a complex baseband signal (spec §4.4).

use crate::errors::DspError;
use num_complex::Complex32;
use std::f32::consts::PI;

/// `y[n] = unwrap(angle(x))[n+1] - unwrap(angle(x))[n]`. Output length is
/// input length minus one. Errors (does not panic) on empty input.
pub fn fm_demod(x: &[Complex32]) -> Result<Vec<f32>, DspError> {
    if x.is_empty() {
        return Err(DspError::EmptyInput {
            stage: "fm_demod".to_string(),
        });
    }
    if x.len() == 1 {
        return Ok(Vec::new());
    }

    let angles: Vec<f32> = x.iter().map(|s| s.arg()).collect();
    let unwrapped = unwrap_phase(&angles);

    Ok(unwrapped.windows(2).map(|w| w[1] - w[0]).collect())
}

/// Classic phase-unwrap: accumulates 2π corrections whenever the jump
/// between successive samples exceeds π.
fn unwrap_phase(angles: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(angles.len());
    let mut offset = 0.0f32;
    let mut prev = angles[0];
    out.push(prev);
    for &a in &angles[1..] {
        let delta = a - prev;
        if delta > PI {
            offset -= 2.0 * PI;
        } else if delta < -PI {
            offset += 2.0 * PI;
        }
        prev = a;
        out.push(a + offset);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_an_error() {
        assert!(fm_demod(&[]).is_err());
    }

    #[test]
    fn output_length_is_input_length_minus_one() {
        let x: Vec<Complex32> = (0..10).map(|i| Complex32::new(1.0, i as f32 * 0.1)).collect();
        let y = fm_demod(&x).unwrap();
        assert_eq!(y.len(), x.len() - 1);
    }

    #[test]
    fn constant_phase_produces_zero_message() {
        let x = vec![Complex32::new(1.0, 0.0); 8];
        let y = fm_demod(&x).unwrap();
        for v in y {
            assert!(v.abs() < 1e-6);
        }
    }

    #[test]
    fn rotating_phasor_recovers_constant_frequency() {
        let n = 64;
        let step = 0.05f32;
        let x: Vec<Complex32> = (0..n).map(|i| Complex32::from_polar(1.0, step * i as f32)).collect();
        let y = fm_demod(&x).unwrap();
        for v in y {
            assert!((v - step).abs() < 1e-4);
        }
    }
}
