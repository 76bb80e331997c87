//! Playing frames on a PCM device

use ndarray::ArrayView2;
use tracing::{debug, warn};

use crate::device::{Direction, PcmDevice};
use crate::error::{AudioError, Result};
use crate::frame::{check_channels, samples_from_bytes, SampleArray};
use crate::timeout_millis;

#[cfg(feature = "alsa-backend")]
use crate::{alsa_pcm::AlsaPcm, PcmConfig};

/// Playback on an ALSA device
#[cfg(feature = "alsa-backend")]
pub type AlsaOutput = PcmOutput<AlsaPcm>;

/// Plays `(samples, channels)` frames of signed 16-bit samples
///
/// Writes block until there is room in the output buffer. Playback resumes
/// after an underrun.
pub struct PcmOutput<D: PcmDevice> {
    name: String,
    rate: u32,
    channels: u32,
    device: Option<D>,
}

#[cfg(feature = "alsa-backend")]
impl PcmOutput<AlsaPcm> {
    /// Open a sound device for playback
    ///
    /// The desired sample rate may not be supported; the sound library then
    /// picks a rate near it, see [`rate`](Self::rate).
    pub fn open(config: &PcmConfig) -> Result<Self> {
        AlsaPcm::playback(config).and_then(Self::from_device)
    }

    /// Open the default playback device with default parameters
    pub fn open_default() -> Result<Self> {
        Self::open(&PcmConfig::default())
    }
}

impl<D: PcmDevice> PcmOutput<D> {
    /// Wrap an already opened playback device
    pub fn from_device(device: D) -> Result<Self> {
        if device.direction() != Direction::Playback {
            return Err(AudioError::device(format!(
                "PCM device \"{}\" is not open for playback",
                device.name()
            )));
        }
        Ok(Self {
            name: device.name().to_string(),
            rate: device.rate(),
            channels: device.channels(),
            device: Some(device),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sample rate of the device, which may differ from the one requested
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    pub fn device(&self) -> Option<&D> {
        self.device.as_ref()
    }

    fn device_mut(&mut self) -> Result<&mut D> {
        match self.device.as_mut() {
            Some(device) => Ok(device),
            None => Err(AudioError::NotOpen(self.name.clone())),
        }
    }

    /// Close the device. Closing twice is harmless.
    pub fn close(&mut self) {
        if self.device.take().is_some() {
            debug!("Closed playback device \"{}\"", self.name);
        }
    }

    /// Write a `(samples, channels)` frame to the output buffer
    ///
    /// The channel axis must match the device.
    pub fn write(&mut self, frame: ArrayView2<'_, i16>) -> Result<()> {
        check_channels(frame.ncols(), self.channels)?;
        let data = frame.as_standard_layout();
        match data.as_slice() {
            Some(samples) => self.write_samples(samples),
            None => Err(AudioError::Internal("frame is not contiguous".into())),
        }
    }

    /// Validate element type, dimensionality and channel count of `array`,
    /// then write it
    pub fn write_array(&mut self, array: &SampleArray) -> Result<()> {
        let frame = array.as_frame(self.channels)?;
        self.write(frame)
    }

    /// Write interleaved S16_LE bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let samples = samples_from_bytes(bytes, self.channels as usize)?;
        self.write_samples(&samples)
    }

    fn write_samples(&mut self, samples: &[i16]) -> Result<()> {
        let channels = self.channels as usize;
        let name = self.name.clone();
        let device = self.device_mut()?;
        let requested = samples.len() / channels;

        let mut offset = 0;
        while offset < samples.len() {
            match device.write_interleaved(&samples[offset..]) {
                Ok(0) => {
                    return Err(AudioError::ShortWrite {
                        device: name,
                        written: offset / channels,
                        requested,
                    });
                }
                Ok(written) => offset += written * channels,
                Err(fault) => {
                    warn!("Playback on PCM device \"{}\" failed ({}), recovering", name, fault);
                    device
                        .recover(&fault)
                        .map_err(|e| AudioError::fault("writing audio frames to", &name, &e))?;
                }
            }
        }
        Ok(())
    }

    /// Discard the content of the output buffer
    ///
    /// Call [`prepare`](Self::prepare) before writing again.
    pub fn drop_buffer(&mut self) -> Result<()> {
        let name = self.name.clone();
        self.device_mut()?
            .drop_pending()
            .map_err(|e| AudioError::fault("dropping frames of", &name, &e))
    }

    /// Block until everything in the output buffer has been played
    pub fn drain(&mut self) -> Result<()> {
        let name = self.name.clone();
        self.device_mut()?
            .drain()
            .map_err(|e| AudioError::fault("draining", &name, &e))
    }

    /// Frames that can be written without blocking
    pub fn avail(&mut self) -> Result<usize> {
        let name = self.name.clone();
        self.device_mut()?
            .avail()
            .map_err(|e| AudioError::fault("querying available frames of", &name, &e))
    }

    /// Frames left to play. Use this to synchronise video with audio output.
    pub fn delay(&mut self) -> Result<i64> {
        let name = self.name.clone();
        self.device_mut()?
            .delay()
            .map_err(|e| AudioError::fault("querying delay of", &name, &e))
    }

    /// Reset the device, e.g. to resume playing after
    /// [`drop_buffer`](Self::drop_buffer)
    pub fn prepare(&mut self) -> Result<()> {
        let name = self.name.clone();
        self.device_mut()?
            .prepare()
            .map_err(|e| AudioError::fault("preparing", &name, &e))
    }

    /// Wait up to `seconds` for room in the output buffer; negative waits
    /// indefinitely. Returns false on timeout.
    pub fn wait(&mut self, seconds: f64) -> Result<bool> {
        let name = self.name.clone();
        self.device_mut()?
            .wait(timeout_millis(seconds))
            .map_err(|e| AudioError::fault("waiting for", &name, &e))
    }
}
