//! Audio frames and their byte representation
//!
//! A frame is a two-dimensional `i16` array of shape `(samples, channels)`.
//! The channel axis is the fastest-varying one, so a frame in standard layout
//! is already interleaved PCM and the byte form is S16_LE.

use std::fmt;

use ndarray::{Array2, ArrayD, ArrayView2, Ix2};

use crate::error::{AudioError, Result};

/// Bytes per sample (signed 16-bit)
pub const SAMPLE_BYTES: usize = 2;

/// Element type of a dynamically-typed array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleType {
    U8,
    I16,
    I32,
    F32,
    F64,
    /// Any element type without a dedicated tag, by name
    Other(String),
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleType::U8 => write!(f, "u8"),
            SampleType::I16 => write!(f, "i16"),
            SampleType::I32 => write!(f, "i32"),
            SampleType::F32 => write!(f, "f32"),
            SampleType::F64 => write!(f, "f64"),
            SampleType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// N-dimensional array whose element type is only known at runtime
#[derive(Debug, Clone)]
pub enum SampleArray {
    U8(ArrayD<u8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl SampleArray {
    pub fn sample_type(&self) -> SampleType {
        match self {
            SampleArray::U8(_) => SampleType::U8,
            SampleArray::I16(_) => SampleType::I16,
            SampleArray::I32(_) => SampleType::I32,
            SampleArray::F32(_) => SampleType::F32,
            SampleArray::F64(_) => SampleType::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            SampleArray::U8(a) => a.shape(),
            SampleArray::I16(a) => a.shape(),
            SampleArray::I32(a) => a.shape(),
            SampleArray::F32(a) => a.shape(),
            SampleArray::F64(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Validate against a device with `channels` channels and borrow the
    /// result as a frame.
    pub fn as_frame(&self, channels: u32) -> Result<ArrayView2<'_, i16>> {
        check_layout(&self.sample_type(), self.shape(), channels)?;
        match self {
            SampleArray::I16(a) => a
                .view()
                .into_dimensionality::<Ix2>()
                .map_err(|e| AudioError::invalid_frame(e.to_string())),
            _ => Err(AudioError::Internal("sample type changed during validation".into())),
        }
    }
}

impl From<Array2<i16>> for SampleArray {
    fn from(frame: Array2<i16>) -> Self {
        SampleArray::I16(frame.into_dyn())
    }
}

/// Check element type, dimensionality and channel count of a frame, in that
/// order.
pub fn check_layout(sample_type: &SampleType, shape: &[usize], channels: u32) -> Result<()> {
    if *sample_type != SampleType::I16 {
        return Err(AudioError::invalid_frame(format!(
            "Audio data must be of type {} (but was {})",
            SampleType::I16,
            sample_type
        )));
    }
    if shape.len() != 2 {
        return Err(AudioError::invalid_frame(format!(
            "Audio frame must have two dimensions (but had {})",
            shape.len()
        )));
    }
    check_channels(shape[1], channels)
}

pub(crate) fn check_channels(actual: usize, channels: u32) -> Result<()> {
    if actual != channels as usize {
        return Err(AudioError::invalid_frame(format!(
            "Audio frame must have {} channel(s) but had {}",
            channels, actual
        )));
    }
    Ok(())
}

/// Wrap interleaved samples as a `(samples, channels)` frame
pub fn frame_from_samples(samples: Vec<i16>, channels: usize) -> Result<Array2<i16>> {
    if channels == 0 {
        return Err(AudioError::invalid_frame("Audio frame must have at least one channel"));
    }
    if samples.len() % channels != 0 {
        return Err(AudioError::invalid_frame(format!(
            "{} samples do not divide into {} channel(s)",
            samples.len(),
            channels
        )));
    }
    let frames = samples.len() / channels;
    Array2::from_shape_vec((frames, channels), samples)
        .map_err(|e| AudioError::invalid_frame(e.to_string()))
}

/// Flatten a frame into S16_LE bytes in interleaved order
pub fn frame_to_bytes(frame: ArrayView2<'_, i16>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.len() * SAMPLE_BYTES);
    for sample in frame.iter() {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Decode S16_LE bytes into a `(samples, channels)` frame
pub fn frame_from_bytes(bytes: &[u8], channels: usize) -> Result<Array2<i16>> {
    samples_from_bytes(bytes, channels).and_then(|samples| frame_from_samples(samples, channels))
}

pub(crate) fn samples_from_bytes(bytes: &[u8], channels: usize) -> Result<Vec<i16>> {
    let stride = SAMPLE_BYTES * channels.max(1);
    if bytes.len() % stride != 0 {
        return Err(AudioError::invalid_frame(format!(
            "Audio buffer of {} bytes is not a whole number of {}-channel frames",
            bytes.len(),
            channels
        )));
    }
    Ok(bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3, IxDyn};

    #[test]
    fn test_check_layout_rejects_wrong_type_first() {
        // Wrong type and wrong dimension: the type is reported
        let err = check_layout(&SampleType::F32, &[4], 2).unwrap_err();
        assert_eq!(err.to_string(), "Audio data must be of type i16 (but was f32)");
    }

    #[test]
    fn test_check_layout_rejects_wrong_dimension() {
        let err = check_layout(&SampleType::I16, &[4, 2, 1], 2).unwrap_err();
        assert_eq!(err.to_string(), "Audio frame must have two dimensions (but had 3)");
    }

    #[test]
    fn test_check_layout_rejects_wrong_channels() {
        let err = check_layout(&SampleType::I16, &[4, 1], 2).unwrap_err();
        assert_eq!(err.to_string(), "Audio frame must have 2 channel(s) but had 1");
    }

    #[test]
    fn test_check_layout_accepts_empty_frame() {
        assert!(check_layout(&SampleType::I16, &[0, 2], 2).is_ok());
    }

    #[test]
    fn test_sample_array_as_frame() {
        let array = SampleArray::from(array![[1i16, -1], [2, -2], [3, -3]]);
        let frame = array.as_frame(2).unwrap();
        assert_eq!(frame.dim(), (3, 2));
        assert_eq!(frame[[2, 1]], -3);

        let floats = SampleArray::F64(ArrayD::zeros(IxDyn(&[3, 2])));
        assert!(floats.as_frame(2).is_err());

        let cube = SampleArray::I16(Array3::<i16>::zeros((2, 2, 2)).into_dyn());
        assert_eq!(cube.ndim(), 3);
        assert!(cube.as_frame(2).is_err());
    }

    #[test]
    fn test_other_sample_type_is_named() {
        let err = check_layout(&SampleType::Other("complex64".into()), &[1, 1], 1).unwrap_err();
        assert!(err.to_string().contains("complex64"));
    }

    #[test]
    fn test_frame_to_bytes_is_interleaved_little_endian() {
        let frame = array![[0x0102i16, -2], [0x7fff, i16::MIN]];
        let bytes = frame_to_bytes(frame.view());
        assert_eq!(bytes, vec![0x02, 0x01, 0xfe, 0xff, 0xff, 0x7f, 0x00, 0x80]);
    }

    #[test]
    fn test_frame_to_bytes_follows_logical_order_of_transposed_view() {
        // Channel-major storage viewed as (samples, channels)
        let planar = array![[1i16, 2, 3], [10, 20, 30]];
        let bytes = frame_to_bytes(planar.t());
        let frame = frame_from_bytes(&bytes, 2).unwrap();
        assert_eq!(frame, array![[1i16, 10], [2, 20], [3, 30]]);
    }

    #[test]
    fn test_frame_from_bytes_rejects_partial_frame() {
        // 3 bytes: not even a whole sample
        assert!(frame_from_bytes(&[0, 0, 0], 1).is_err());
        // One sample short of a stereo frame
        assert!(frame_from_bytes(&[0, 0, 0, 0, 0, 0], 2).is_err());
    }

    #[test]
    fn test_frame_from_samples_shape() {
        let frame = frame_from_samples(vec![1, 2, 3, 4, 5, 6], 3).unwrap();
        assert_eq!(frame.dim(), (2, 3));
        assert_eq!(frame.row(1).to_vec(), vec![4, 5, 6]);
        assert!(frame_from_samples(vec![1, 2, 3], 2).is_err());
        assert!(frame_from_samples(vec![], 0).is_err());
    }
}
