//! PCM Frame Audio
//!
//! Capture and play signed 16-bit PCM audio through ALSA, one validated frame
//! at a time.
//!
//! ## Features
//!
//! - Default device parameters for capture and playback
//! - Frame validation (element type, dimensionality, channel count) before
//!   anything reaches the sound library
//! - Conversion between `ndarray` frames and flat S16_LE byte buffers
//! - PyO3 bindings exchanging numpy arrays (feature `pyo3-bindings`)
//!
//! Buffer scheduling, xrun handling, blocking I/O and hardware negotiation are
//! left to ALSA.
//!
//! ## Architecture
//!
//! ```text
//! AlsaInput / AlsaOutput (PcmInput / PcmOutput)
//!   │   frame validation, byte conversion, recovery loop
//!   │
//!   └─> PcmDevice
//!         ├─> AlsaPcm   (alsa crate, libasound)
//!         └─> MemoryPcm (ringbuf, tests and loopback)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! # #[cfg(feature = "alsa-backend")]
//! # fn main() -> pcmframe_audio::Result<()> {
//! use pcmframe_audio::{AlsaInput, PcmConfig};
//!
//! let mut microphone = AlsaInput::open(&PcmConfig::new("default:0", 44_100, 2))?;
//! let data = microphone.read(3 * 44_100)?;
//! assert_eq!(data.dim(), (3 * 44_100, 2));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "alsa-backend"))]
//! # fn main() {}
//! ```

pub mod buffer;
pub mod device;
pub mod error;
pub mod frame;
pub mod input;
pub mod memory;
pub mod output;

#[cfg(feature = "alsa-backend")]
pub mod alsa_pcm;

#[cfg(feature = "pyo3-bindings")]
pub mod python;

use serde::{Deserialize, Serialize};

pub use buffer::FrameRing;
pub use device::{DeviceFault, Direction, PcmDevice};
pub use error::{AudioError, Result};
pub use frame::{
    check_layout, frame_from_bytes, frame_from_samples, frame_to_bytes, SampleArray, SampleType,
};
pub use input::PcmInput;
pub use memory::{MemoryHandle, MemoryPcm};
pub use output::PcmOutput;

#[cfg(feature = "alsa-backend")]
pub use alsa_pcm::{list_devices, AlsaPcm, DeviceInfo};
#[cfg(feature = "alsa-backend")]
pub use input::AlsaInput;
#[cfg(feature = "alsa-backend")]
pub use output::AlsaOutput;

#[cfg(feature = "pyo3-bindings")]
use pyo3::prelude::*;

/// Default PCM device name
pub const DEFAULT_PCM_NAME: &str = "default:0";

/// Default desired sample rate in Hz
pub const DEFAULT_RATE: u32 = 48000;

/// Default number of channels (stereo)
pub const DEFAULT_CHANNELS: u32 = 2;

/// Default number of periods in the device buffer
pub const DEFAULT_PERIODS: u32 = 8;

/// Default device buffer size in frames
pub const DEFAULT_FRAMES: usize = 1024;

/// PCM device configuration
///
/// The sound library may not support the desired rate or buffer size exactly;
/// it then picks the nearest values it supports. Query the opened device for
/// the negotiated rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcmConfig {
    /// Name of the PCM device (default: "default:0")
    pub pcm_name: String,
    /// Desired sample rate (default: 48000 Hz)
    pub rate: u32,
    /// Number of channels (default: 2 = stereo)
    pub channels: u32,
    /// Number of periods in the device buffer (default: 8)
    pub periods: u32,
    /// Device buffer size in frames (default: 1024)
    pub frames: usize,
}

impl Default for PcmConfig {
    fn default() -> Self {
        Self {
            pcm_name: DEFAULT_PCM_NAME.to_string(),
            rate: DEFAULT_RATE,
            channels: DEFAULT_CHANNELS,
            periods: DEFAULT_PERIODS,
            frames: DEFAULT_FRAMES,
        }
    }
}

impl PcmConfig {
    /// Configuration for `pcm_name` with the given rate and channel count and
    /// default buffer geometry
    pub fn new<S: Into<String>>(pcm_name: S, rate: u32, channels: u32) -> Self {
        Self {
            pcm_name: pcm_name.into(),
            rate,
            channels,
            ..Self::default()
        }
    }

    pub fn with_buffer(mut self, periods: u32, frames: usize) -> Self {
        self.periods = periods;
        self.frames = frames;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.pcm_name.is_empty() {
            return Err(AudioError::invalid_config("PCM device name cannot be empty"));
        }
        if self.rate == 0 {
            return Err(AudioError::invalid_config("Sample rate cannot be zero"));
        }
        if self.channels == 0 {
            return Err(AudioError::invalid_config("Channel count cannot be zero"));
        }
        if self.periods == 0 {
            return Err(AudioError::invalid_config("Period count cannot be zero"));
        }
        if self.frames == 0 {
            return Err(AudioError::invalid_config("Buffer size cannot be zero"));
        }
        Ok(())
    }
}

/// Convert a wait duration in seconds to the millisecond timeout the sound
/// library expects. Negative or non-finite durations wait indefinitely.
pub fn timeout_millis(seconds: f64) -> Option<u32> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let millis = (seconds * 1000.0).round();
    if millis >= u32::MAX as f64 {
        None
    } else {
        Some(millis as u32)
    }
}

#[cfg(feature = "pyo3-bindings")]
#[pymodule]
fn pcmframe_audio(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyAlsaInput>()?;
    m.add_class::<python::PyAlsaOutput>()?;
    m.add("DEFAULT_PCM_NAME", DEFAULT_PCM_NAME)?;
    m.add("DEFAULT_RATE", DEFAULT_RATE)?;
    m.add("DEFAULT_CHANNELS", DEFAULT_CHANNELS)?;
    m.add("DEFAULT_PERIODS", DEFAULT_PERIODS)?;
    m.add("DEFAULT_FRAMES", DEFAULT_FRAMES)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PcmConfig::default();
        assert_eq!(config.pcm_name, "default:0");
        assert_eq!(config.rate, 48000);
        assert_eq!(config.channels, 2);
        assert_eq!(config.periods, 8);
        assert_eq!(config.frames, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PcmConfig =
            serde_json::from_str(r#"{"pcm_name": "hw:1,0", "rate": 44100}"#).unwrap();
        assert_eq!(config.pcm_name, "hw:1,0");
        assert_eq!(config.rate, 44100);
        assert_eq!(config.channels, DEFAULT_CHANNELS);
        assert_eq!(config.frames, DEFAULT_FRAMES);
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        assert!(PcmConfig::new("default", 0, 2).validate().is_err());
        assert!(PcmConfig::new("default", 44100, 0).validate().is_err());
        assert!(PcmConfig::new("", 44100, 2).validate().is_err());
        assert!(PcmConfig::default().with_buffer(0, 1024).validate().is_err());
        assert!(PcmConfig::default().with_buffer(8, 0).validate().is_err());
    }

    #[test]
    fn test_timeout_millis() {
        assert_eq!(timeout_millis(1.5), Some(1500));
        assert_eq!(timeout_millis(0.0), Some(0));
        assert_eq!(timeout_millis(0.0004), Some(0));
        assert_eq!(timeout_millis(0.0006), Some(1));
        assert_eq!(timeout_millis(-1.0), None);
        assert_eq!(timeout_millis(f64::INFINITY), None);
        assert_eq!(timeout_millis(f64::NAN), None);
        assert_eq!(timeout_millis(1e12), None);
    }
}
