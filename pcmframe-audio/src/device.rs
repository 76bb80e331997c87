//! The seam between the frame wrappers and a PCM implementation
//!
//! [`PcmInput`](crate::PcmInput) and [`PcmOutput`](crate::PcmOutput) only
//! marshal frames. Everything that touches a sound card goes through
//! [`PcmDevice`], implemented by [`AlsaPcm`](crate::AlsaPcm) for real
//! hardware and [`MemoryPcm`](crate::MemoryPcm) for tests.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stream direction of a PCM device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Capture,
    Playback,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Capture => write!(f, "capture"),
            Direction::Playback => write!(f, "playback"),
        }
    }
}

/// Error reported by the native sound library
///
/// `errno` is the positive error number (`EPIPE` for an xrun, `ESTRPIPE` for
/// a suspended stream, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{description}")]
pub struct DeviceFault {
    pub errno: i32,
    pub description: String,
}

impl DeviceFault {
    pub fn new<S: Into<String>>(errno: i32, description: S) -> Self {
        Self {
            errno,
            description: description.into(),
        }
    }

    /// Underrun (playback) or overrun (capture)
    pub fn xrun() -> Self {
        Self::new(libc::EPIPE, "Broken pipe")
    }

    pub fn suspended() -> Self {
        Self::new(libc::ESTRPIPE, "Streams pipe error")
    }

    pub fn bad_state() -> Self {
        Self::new(libc::EBADFD, "File descriptor in bad state")
    }

    /// Faults a stream can be recovered from by re-preparing it
    pub fn is_recoverable(&self) -> bool {
        [libc::EPIPE, libc::ESTRPIPE, libc::EINTR].contains(&self.errno)
    }
}

pub type FaultResult<T> = std::result::Result<T, DeviceFault>;

/// An open PCM stream with interleaved signed 16-bit samples
///
/// Frame counts are in frames (one sample per channel). Buffers passed to
/// [`read_interleaved`](PcmDevice::read_interleaved) and
/// [`write_interleaved`](PcmDevice::write_interleaved) hold whole frames.
pub trait PcmDevice: Send {
    fn name(&self) -> &str;

    fn direction(&self) -> Direction;

    /// Sample rate negotiated with the device
    fn rate(&self) -> u32;

    fn channels(&self) -> u32;

    /// Device buffer size negotiated with the device, in frames
    fn buffer_size(&self) -> usize;

    /// Read up to `buf.len() / channels` frames, blocking until they arrive
    fn read_interleaved(&mut self, buf: &mut [i16]) -> FaultResult<usize>;

    /// Write up to `buf.len() / channels` frames, blocking for buffer space
    fn write_interleaved(&mut self, buf: &[i16]) -> FaultResult<usize>;

    /// Recover the stream after `fault`; fails if the fault is not an xrun
    /// or suspend condition.
    fn recover(&mut self, fault: &DeviceFault) -> FaultResult<()>;

    fn avail(&mut self) -> FaultResult<usize>;

    fn delay(&mut self) -> FaultResult<i64>;

    fn prepare(&mut self) -> FaultResult<()>;

    /// Stop the stream and discard pending frames
    fn drop_pending(&mut self) -> FaultResult<()>;

    /// Stop the stream after pending frames have been played
    fn drain(&mut self) -> FaultResult<()>;

    /// Wait for the stream to become ready; `None` waits indefinitely.
    /// Returns false on timeout.
    fn wait(&mut self, timeout_ms: Option<u32>) -> FaultResult<bool>;
}
