//! 16-bit PCM WAV files

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use ndarray::{Array2, ArrayView2};
use pcmframe_audio::{frame_from_samples, PcmConfig};

/// Decoded WAV file
#[derive(Debug, Clone)]
pub struct WavClip {
    pub rate: u32,
    pub channels: u32,
    /// `(samples, channels)`
    pub frame: Array2<i16>,
}

impl WavClip {
    /// Device parameters for playing this clip
    ///
    /// The device is opened at the clip's sample rate. The channel count is
    /// not converted, so it must match the configured one.
    pub fn playback_config(&self, config: &PcmConfig) -> Result<PcmConfig> {
        if self.channels != config.channels {
            bail!(
                "WAV file has {} channel(s) but PCM device \"{}\" is configured for {}",
                self.channels,
                config.pcm_name,
                config.channels
            );
        }
        Ok(PcmConfig {
            rate: self.rate,
            ..config.clone()
        })
    }
}

/// Read a 16-bit integer WAV file
pub fn read_wav(path: &Path) -> Result<WavClip> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!(
            "{} must contain 16-bit integer samples (has {}-bit {:?})",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        );
    }

    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    let frame = frame_from_samples(samples, spec.channels as usize)?;

    Ok(WavClip {
        rate: spec.sample_rate,
        channels: spec.channels as u32,
        frame,
    })
}

/// WAV file written frame by frame
pub struct WavSink {
    writer: WavWriter<BufWriter<File>>,
    frames: usize,
}

impl WavSink {
    pub fn create(path: &Path, rate: u32, channels: u32) -> Result<Self> {
        let channels = u16::try_from(channels)
            .with_context(|| format!("Cannot write {} channels to a WAV file", channels))?;
        let spec = WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create WAV file {}", path.display()))?;
        Ok(Self { writer, frames: 0 })
    }

    /// Append a `(samples, channels)` frame
    pub fn append(&mut self, frame: ArrayView2<'_, i16>) -> Result<()> {
        for &sample in frame.iter() {
            self.writer.write_sample(sample)?;
        }
        self.frames += frame.nrows();
        Ok(())
    }

    /// Frames written so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("Failed to finalize WAV file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        let mut sink = WavSink::create(&path, 22_050, 2).unwrap();
        sink.append(array![[1i16, -1], [2, -2]].view()).unwrap();
        sink.append(array![[3i16, -3]].view()).unwrap();
        assert_eq!(sink.frames(), 3);
        sink.finalize().unwrap();

        let clip = read_wav(&path).unwrap();
        assert_eq!(clip.rate, 22_050);
        assert_eq!(clip.channels, 2);
        assert_eq!(clip.frame, array![[1i16, -1], [2, -2], [3, -3]]);
    }

    #[test]
    fn test_rejects_float_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        let err = read_wav(&path).unwrap_err();
        assert!(err.to_string().contains("16-bit integer samples"));
    }

    #[test]
    fn test_playback_config_takes_clip_rate() {
        let clip = WavClip {
            rate: 22_050,
            channels: 2,
            frame: Array2::zeros((4, 2)),
        };
        let config = PcmConfig::new("hw:1,0", 48_000, 2).with_buffer(4, 512);

        let playback = clip.playback_config(&config).unwrap();
        assert_eq!(playback.rate, 22_050);
        assert_eq!(playback.pcm_name, "hw:1,0");
        assert_eq!(playback.frames, 512);
    }

    #[test]
    fn test_playback_config_rejects_channel_mismatch() {
        let clip = WavClip {
            rate: 44_100,
            channels: 1,
            frame: Array2::zeros((4, 1)),
        };
        let err = clip.playback_config(&PcmConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "WAV file has 1 channel(s) but PCM device \"default:0\" is configured for 2"
        );
    }

    #[test]
    fn test_too_many_channels() {
        let dir = tempfile::tempdir().unwrap();
        let err = WavSink::create(&dir.path().join("wide.wav"), 8_000, 70_000)
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Cannot write 70000 channels to a WAV file");
    }

    #[test]
    fn test_missing_file() {
        let err = read_wav(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to open WAV file"));
    }
}
