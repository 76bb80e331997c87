//! Error types for PCM capture and playback

use thiserror::Error;

use crate::device::DeviceFault;

pub type Result<T> = std::result::Result<T, AudioError>;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("{0}")]
    DeviceError(String),

    #[error("{0}")]
    StreamError(String),

    #[error("PCM device \"{0}\" is not open. Did you call \"close\" before?")]
    NotOpen(String),

    #[error("Only managed to read {read} of {requested} frames from PCM device \"{device}\"")]
    ShortRead {
        device: String,
        read: usize,
        requested: usize,
    },

    #[error("Only managed to write {written} of {requested} frames to PCM device \"{device}\"")]
    ShortWrite {
        device: String,
        written: usize,
        requested: usize,
    },

    #[error("{0}")]
    InvalidFrame(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AudioError {
    pub fn device<S: Into<String>>(msg: S) -> Self {
        Self::DeviceError(msg.into())
    }

    pub fn stream<S: Into<String>>(msg: S) -> Self {
        Self::StreamError(msg.into())
    }

    pub fn invalid_frame<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFrame(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Wrap a device fault raised while talking to PCM device `device`.
    ///
    /// `action` reads like "reading audio frames from" and completes the
    /// sentence "Error <action> PCM device ...".
    pub fn fault(action: &str, device: &str, fault: &DeviceFault) -> Self {
        Self::stream(format!(
            "Error {} PCM device \"{}\": {}",
            action, device, fault
        ))
    }
}
