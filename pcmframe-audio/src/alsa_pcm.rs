//! ALSA PCM device
//!
//! Opens a blocking interleaved S16_LE stream and negotiates rate, channels,
//! periods and buffer size. Reads, writes, xrun recovery and all stream
//! control are forwarded to libasound.

use alsa::device_name::HintIter;
use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::ValueOr;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::device::{DeviceFault, Direction, FaultResult, PcmDevice};
use crate::error::{AudioError, Result};
use crate::PcmConfig;

fn to_alsa(direction: Direction) -> alsa::Direction {
    match direction {
        Direction::Capture => alsa::Direction::Capture,
        Direction::Playback => alsa::Direction::Playback,
    }
}

fn to_fault(err: &alsa::Error) -> DeviceFault {
    DeviceFault::new(err.errno(), err.to_string())
}

/// PCM device opened through libasound
pub struct AlsaPcm {
    pcm: PCM,
    name: String,
    direction: Direction,
    rate: u32,
    channels: u32,
    buffer_size: usize,
    /// Error of the last failed read or write, handed back to
    /// `snd_pcm_recover`
    last_error: Option<alsa::Error>,
}

impl AlsaPcm {
    /// Open `config.pcm_name` and negotiate the hardware parameters
    ///
    /// The device may not support the desired sample rate or buffer size. In
    /// that case the nearest supported value is used; see [`PcmDevice::rate`].
    pub fn open(direction: Direction, config: &PcmConfig) -> Result<Self> {
        config.validate()?;
        let name = config.pcm_name.as_str();

        let pcm = PCM::new(name, to_alsa(direction), false).map_err(|e| {
            AudioError::device(format!("Error opening PCM device \"{}\": {}", name, e))
        })?;

        // On any failure below `pcm` is dropped, which closes the device.
        let (rate, buffer_size) = {
            let hwp = HwParams::any(&pcm).map_err(|e| {
                AudioError::device(format!(
                    "Unable to configure the PCM device \"{}\": {}",
                    name, e
                ))
            })?;
            hwp.set_access(Access::RWInterleaved).map_err(|e| {
                AudioError::device(format!(
                    "Error setting PCM device \"{}\" to interlaced access: {}",
                    name, e
                ))
            })?;
            hwp.set_format(Format::S16LE).map_err(|e| {
                AudioError::device(format!(
                    "Error setting PCM device \"{}\" to 16-bit signed integer format: {}",
                    name, e
                ))
            })?;
            let rate = hwp
                .set_rate_near(config.rate, ValueOr::Nearest)
                .map_err(|e| {
                    AudioError::device(format!(
                        "Error setting sampling rate of PCM device \"{}\" to {} Hz: {}",
                        name, config.rate, e
                    ))
                })?;
            hwp.set_channels(config.channels).map_err(|e| {
                AudioError::device(format!(
                    "Error setting number of channels of PCM device \"{}\" to {}: {}",
                    name, config.channels, e
                ))
            })?;
            hwp.set_periods(config.periods, ValueOr::Nearest)
                .map_err(|e| {
                    AudioError::device(format!(
                        "Error setting number of periods of PCM device \"{}\" to {}: {}",
                        name, config.periods, e
                    ))
                })?;
            let buffer_size = hwp
                .set_buffer_size_near(config.frames as Frames)
                .map_err(|e| {
                    AudioError::device(format!(
                        "Error setting buffer size of PCM device \"{}\" to {} frames: {}",
                        name, config.frames, e
                    ))
                })?;
            pcm.hw_params(&hwp).map_err(|e| {
                AudioError::device(format!(
                    "Error setting parameters of PCM device \"{}\": {}",
                    name, e
                ))
            })?;
            (rate, buffer_size.max(0) as usize)
        };

        if rate != config.rate {
            warn!(
                "PCM device \"{}\" does not support {} Hz, using {} Hz",
                name, config.rate, rate
            );
        }
        info!(
            "Opened PCM device \"{}\" for {}: {} Hz, {} channel(s), {} periods, {} frames",
            name, direction, rate, config.channels, config.periods, buffer_size
        );

        Ok(Self {
            pcm,
            name: name.to_string(),
            direction,
            rate,
            channels: config.channels,
            buffer_size,
            last_error: None,
        })
    }

    pub fn capture(config: &PcmConfig) -> Result<Self> {
        Self::open(Direction::Capture, config)
    }

    pub fn playback(config: &PcmConfig) -> Result<Self> {
        Self::open(Direction::Playback, config)
    }

    fn remember(&mut self, err: alsa::Error) -> DeviceFault {
        let fault = to_fault(&err);
        self.last_error = Some(err);
        fault
    }
}

impl PcmDevice for AlsaPcm {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn rate(&self) -> u32 {
        self.rate
    }

    fn channels(&self) -> u32 {
        self.channels
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn read_interleaved(&mut self, buf: &mut [i16]) -> FaultResult<usize> {
        let result = self.pcm.io_i16().and_then(|io| io.readi(buf));
        result.map_err(|e| self.remember(e))
    }

    fn write_interleaved(&mut self, buf: &[i16]) -> FaultResult<usize> {
        let result = self.pcm.io_i16().and_then(|io| io.writei(buf));
        result.map_err(|e| self.remember(e))
    }

    fn recover(&mut self, fault: &DeviceFault) -> FaultResult<()> {
        match self.last_error.take() {
            Some(err) => self.pcm.try_recover(err, true).map_err(|e| to_fault(&e)),
            None if fault.is_recoverable() => self.pcm.prepare().map_err(|e| to_fault(&e)),
            None => Err(fault.clone()),
        }
    }

    fn avail(&mut self) -> FaultResult<usize> {
        self.pcm
            .avail()
            .map(|frames| frames.max(0) as usize)
            .map_err(|e| to_fault(&e))
    }

    fn delay(&mut self) -> FaultResult<i64> {
        self.pcm.delay().map(|frames| frames as i64).map_err(|e| to_fault(&e))
    }

    fn prepare(&mut self) -> FaultResult<()> {
        self.pcm.prepare().map_err(|e| to_fault(&e))
    }

    fn drop_pending(&mut self) -> FaultResult<()> {
        self.pcm.drop().map_err(|e| to_fault(&e))
    }

    fn drain(&mut self) -> FaultResult<()> {
        self.pcm.drain().map_err(|e| to_fault(&e))
    }

    fn wait(&mut self, timeout_ms: Option<u32>) -> FaultResult<bool> {
        self.pcm.wait(timeout_ms).map_err(|e| to_fault(&e))
    }
}

impl Drop for AlsaPcm {
    fn drop(&mut self) {
        debug!("Closing PCM device \"{}\"", self.name);
    }
}

/// PCM device advertised by ALSA
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub description: Option<String>,
    /// `None` when the device supports both directions
    pub direction: Option<Direction>,
}

/// List the PCM devices ALSA knows about
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let hints = HintIter::new_str(None, "pcm")
        .map_err(|e| AudioError::device(format!("Failed to enumerate devices: {}", e)))?;

    Ok(hints
        .filter_map(|hint| {
            let name = hint.name?;
            Some(DeviceInfo {
                name,
                description: hint.desc,
                direction: hint.direction.map(|d| match d {
                    alsa::Direction::Capture => Direction::Capture,
                    alsa::Direction::Playback => Direction::Playback,
                }),
            })
        })
        .collect())
}
