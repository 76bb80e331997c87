//! Capturing frames from a PCM device

use ndarray::Array2;
use tracing::{debug, warn};

use crate::device::{Direction, PcmDevice};
use crate::error::{AudioError, Result};
use crate::frame::{frame_from_samples, frame_to_bytes};
use crate::timeout_millis;

#[cfg(feature = "alsa-backend")]
use crate::{alsa_pcm::AlsaPcm, PcmConfig};

/// Capture from an ALSA device
#[cfg(feature = "alsa-backend")]
pub type AlsaInput = PcmInput<AlsaPcm>;

/// Captures `(samples, channels)` frames of signed 16-bit samples
///
/// Reads block until enough samples are in the input buffer. Overruns are
/// recovered by the device and the read is retried.
pub struct PcmInput<D: PcmDevice> {
    name: String,
    rate: u32,
    channels: u32,
    device: Option<D>,
}

#[cfg(feature = "alsa-backend")]
impl PcmInput<AlsaPcm> {
    /// Open a sound device for capture
    ///
    /// The desired sample rate may not be supported; the sound library then
    /// picks a rate near it, see [`rate`](Self::rate).
    pub fn open(config: &PcmConfig) -> Result<Self> {
        AlsaPcm::capture(config).and_then(Self::from_device)
    }

    /// Open the default capture device with default parameters
    pub fn open_default() -> Result<Self> {
        Self::open(&PcmConfig::default())
    }
}

impl<D: PcmDevice> PcmInput<D> {
    /// Wrap an already opened capture device
    pub fn from_device(device: D) -> Result<Self> {
        if device.direction() != Direction::Capture {
            return Err(AudioError::device(format!(
                "PCM device \"{}\" is not open for capture",
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

    /// Access the underlying device
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
            debug!("Closed capture device \"{}\"", self.name);
        }
    }

    /// Read `samples` frames as an array of shape `(samples, channels)`
    pub fn read(&mut self, samples: usize) -> Result<Array2<i16>> {
        let data = self.read_samples(samples)?;
        frame_from_samples(data, self.channels as usize)
    }

    /// Read `samples` frames as interleaved S16_LE bytes
    pub fn read_bytes(&mut self, samples: usize) -> Result<Vec<u8>> {
        let frame = self.read(samples)?;
        Ok(frame_to_bytes(frame.view()))
    }

    fn read_samples(&mut self, samples: usize) -> Result<Vec<i16>> {
        let channels = self.channels as usize;
        let name = self.name.clone();
        let device = self.device_mut()?;
        let len = samples.checked_mul(channels).ok_or_else(|| {
            AudioError::invalid_frame(format!(
                "Cannot read {} frames of {} channel(s) from PCM device \"{}\"",
                samples, channels, name
            ))
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            AudioError::invalid_frame(format!(
                "Cannot allocate {} frames for PCM device \"{}\": {}",
                samples, name, e
            ))
        })?;
        data.resize(len, 0);
        if samples == 0 {
            return Ok(data);
        }

        let read = loop {
            match device.read_interleaved(&mut data) {
                Ok(read) => break read,
                Err(fault) => {
                    warn!("Capture from PCM device \"{}\" failed ({}), recovering", name, fault);
                    device
                        .recover(&fault)
                        .map_err(|e| AudioError::fault("reading audio frames from", &name, &e))?;
                }
            }
        };

        if read != samples {
            return Err(AudioError::ShortRead {
                device: name,
                read,
                requested: samples,
            });
        }
        Ok(data)
    }

    /// Frames that can still be captured before the buffer overflows
    pub fn avail(&mut self) -> Result<usize> {
        let name = self.name.clone();
        self.device_mut()?
            .avail()
            .map_err(|e| AudioError::fault("querying available frames of", &name, &e))
    }

    /// Frames available for retrieval
    pub fn delay(&mut self) -> Result<i64> {
        let name = self.name.clone();
        self.device_mut()?
            .delay()
            .map_err(|e| AudioError::fault("querying delay of", &name, &e))
    }

    /// Reset the device
    pub fn prepare(&mut self) -> Result<()> {
        let name = self.name.clone();
        self.device_mut()?
            .prepare()
            .map_err(|e| AudioError::fault("preparing", &name, &e))
    }

    /// Wait up to `seconds` for captured frames; negative waits indefinitely.
    /// Returns false on timeout.
    pub fn wait(&mut self, seconds: f64) -> Result<bool> {
        let name = self.name.clone();
        self.device_mut()?
            .wait(timeout_millis(seconds))
            .map_err(|e| AudioError::fault("waiting for", &name, &e))
    }
}
