//! Sine tone frames

use anyhow::{bail, Result};
use ndarray::Array2;

/// Lowest tone frequency in Hz; one period then lasts a second
pub const MIN_FREQUENCY: f64 = 1.0;

/// Reject frequencies whose period would not fit in one second of samples
pub fn check_frequency(frequency: f64) -> Result<()> {
    if !frequency.is_finite() || frequency < MIN_FREQUENCY {
        bail!(
            "Frequency must be at least {} Hz (was {})",
            MIN_FREQUENCY,
            frequency
        );
    }
    Ok(())
}

/// One period of a sine wave at `frequency` Hz, repeated on every channel
///
/// The period is `rate / frequency` samples rounded to the nearest integer,
/// so the tone played by repeating it is slightly off for frequencies that do
/// not divide the rate. The period never exceeds `rate` samples.
pub fn sine_period(rate: u32, channels: u32, frequency: f64, amplitude: f64) -> Array2<i16> {
    let period = (rate as f64 / frequency)
        .round()
        .clamp(1.0, rate.max(1) as f64) as usize;
    let scale = amplitude.clamp(0.0, 1.0) * i16::MAX as f64;
    Array2::from_shape_fn((period, channels as usize), |(i, _)| {
        ((i as f64 * std::f64::consts::TAU / period as f64).sin() * scale).round() as i16
    })
}

/// Number of periods of `period_len` samples needed to cover `seconds`
pub fn periods_for(seconds: f64, rate: u32, period_len: usize) -> usize {
    let samples = (seconds.max(0.0) * rate as f64).round() as usize;
    samples.div_ceil(period_len.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_period_shape_and_channels() {
        let wave = sine_period(44_100, 2, 400.0, 1.0);
        // 44100 / 400 = 110.25
        assert_eq!(wave.dim(), (110, 2));
        assert_eq!(wave.column(0), wave.column(1));
        assert_eq!(wave[[0, 0]], 0);
    }

    #[test]
    fn test_amplitude() {
        let wave = sine_period(48_000, 1, 1000.0, 0.5);
        let peak = wave.iter().map(|&s| s.abs()).max().unwrap();
        assert_abs_diff_eq!(peak as f64, 0.5 * i16::MAX as f64, epsilon = 1.0);

        let clipped = sine_period(48_000, 1, 1000.0, 3.0);
        assert_eq!(clipped.iter().copied().max().unwrap(), i16::MAX);
    }

    #[test]
    fn test_sine_is_balanced() {
        let wave = sine_period(48_000, 1, 480.0, 1.0);
        let mean = wave.iter().map(|&s| s as f64).sum::<f64>() / wave.len() as f64;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1.0);
    }

    #[test]
    fn test_low_frequencies() {
        assert!(check_frequency(1.0).is_ok());
        assert!(check_frequency(0.5).is_err());
        assert!(check_frequency(1e-9).is_err());
        assert!(check_frequency(f64::NAN).is_err());
        assert!(check_frequency(-400.0).is_err());

        assert_eq!(sine_period(8_000, 1, 1e-9, 1.0).nrows(), 8_000);
    }

    #[test]
    fn test_periods_for() {
        assert_eq!(periods_for(3.0, 44_100, 110), 1203);
        assert_eq!(periods_for(1.0, 48_000, 100), 480);
        assert_eq!(periods_for(0.0, 48_000, 100), 0);
        assert_eq!(periods_for(-1.0, 48_000, 100), 0);
    }
}
