//! Play a 400Hz tune for 3 seconds

use ndarray::Array2;
use pcmframe_audio::{AlsaOutput, PcmConfig};

fn main() -> anyhow::Result<()> {
    let mut speaker = AlsaOutput::open(&PcmConfig::new("default:0", 44_100, 2))?;

    let period = (speaker.rate() / 400) as usize;
    let wave = Array2::from_shape_fn((period, 2), |(i, _)| {
        ((i as f64 * std::f64::consts::TAU / period as f64).sin() * 0x7FFF as f64) as i16
    });

    for _ in 0..3 * 400 {
        speaker.write(wave.view())?;
    }
    speaker.drain()?;
    Ok(())
}
