//! Python bindings
//!
//! Exposes `AlsaInput` and `AlsaOutput` to Python with numpy `int16` arrays
//! of shape `(samples, channels)` as frames.
//!
//! ```python
//! import numpy as np
//! from pcmframe_audio import AlsaInput, AlsaOutput
//!
//! microphone = AlsaInput("default:0", 44_100, 2)
//! data = microphone.read(3 * 44_100)
//!
//! speaker = AlsaOutput("default:0", 44_100, 2)
//! period = 44_100 // 400
//! t = np.arange(period)
//! wave = (np.sin(t * 2 * np.pi / period) * 0x7FFF).astype(np.int16)
//! wave = np.repeat(wave[:, None], 2, axis=1)
//! for _ in range(3 * 400):
//!     speaker.write(wave)
//! ```

use numpy::{
    IntoPyArray, PyArray2, PyArrayDescrMethods, PyArrayMethods, PyUntypedArray,
    PyUntypedArrayMethods,
};
use parking_lot::Mutex;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::error::AudioError;
use crate::frame::{check_layout, SampleType};
use crate::input::AlsaInput;
use crate::output::AlsaOutput;
use crate::{
    PcmConfig, DEFAULT_CHANNELS, DEFAULT_FRAMES, DEFAULT_PCM_NAME, DEFAULT_PERIODS, DEFAULT_RATE,
};

impl From<AudioError> for PyErr {
    fn from(err: AudioError) -> PyErr {
        PyRuntimeError::new_err(err.to_string())
    }
}

/// Element type of a numpy array
fn sample_type(array: &Bound<'_, PyUntypedArray>) -> SampleType {
    let py = array.py();
    let dtype = array.dtype();
    if dtype.is_equiv_to(&numpy::dtype::<i16>(py)) {
        SampleType::I16
    } else if dtype.is_equiv_to(&numpy::dtype::<u8>(py)) {
        SampleType::U8
    } else if dtype.is_equiv_to(&numpy::dtype::<i32>(py)) {
        SampleType::I32
    } else if dtype.is_equiv_to(&numpy::dtype::<f32>(py)) {
        SampleType::F32
    } else if dtype.is_equiv_to(&numpy::dtype::<f64>(py)) {
        SampleType::F64
    } else {
        SampleType::Other(dtype.to_string())
    }
}

/// Capture audio samples from an ALSA device
#[pyclass(name = "AlsaInput", module = "pcmframe_audio")]
pub struct PyAlsaInput {
    inner: Mutex<AlsaInput>,
}

#[pymethods]
impl PyAlsaInput {
    /// Open a sound device for capture. The device picks the supported rate
    /// nearest to `rate`.
    #[new]
    #[pyo3(signature = (
        pcm_name = DEFAULT_PCM_NAME.to_string(),
        rate = DEFAULT_RATE,
        channels = DEFAULT_CHANNELS,
        periods = DEFAULT_PERIODS,
        frames = DEFAULT_FRAMES
    ))]
    fn new(
        py: Python<'_>,
        pcm_name: String,
        rate: u32,
        channels: u32,
        periods: u32,
        frames: usize,
    ) -> PyResult<Self> {
        let config = PcmConfig::new(pcm_name, rate, channels).with_buffer(periods, frames);
        let inner = py.allow_threads(|| AlsaInput::open(&config))?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    /// Read `samples` frames; blocks until they are available.
    ///
    /// Returns an int16 array of shape (samples, channels).
    fn read<'py>(&self, py: Python<'py>, samples: usize) -> PyResult<Bound<'py, PyArray2<i16>>> {
        let frame = py.allow_threads(|| self.inner.lock().read(samples))?;
        Ok(frame.into_pyarray(py))
    }

    /// Read `samples` frames as interleaved little-endian bytes
    fn read_bytes<'py>(&self, py: Python<'py>, samples: usize) -> PyResult<Bound<'py, PyBytes>> {
        let bytes = py.allow_threads(|| self.inner.lock().read_bytes(samples))?;
        Ok(PyBytes::new(py, &bytes))
    }

    #[getter]
    fn rate(&self) -> u32 {
        self.inner.lock().rate()
    }

    #[getter]
    fn channels(&self) -> u32 {
        self.inner.lock().channels()
    }

    fn close(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf.inner.lock().close();
        slf
    }

    /// Frames left for recording before the buffer overflows
    fn avail(&self) -> PyResult<usize> {
        Ok(self.inner.lock().avail()?)
    }

    /// Frames available for retrieval
    fn delay(&self) -> PyResult<i64> {
        Ok(self.inner.lock().delay()?)
    }

    fn prepare(slf: PyRef<'_, Self>) -> PyResult<PyRef<'_, Self>> {
        slf.inner.lock().prepare()?;
        Ok(slf)
    }

    /// Wait up to `seconds` for input; returns False on timeout
    fn wait(&self, py: Python<'_>, seconds: f64) -> PyResult<bool> {
        Ok(py.allow_threads(|| self.inner.lock().wait(seconds))?)
    }

    fn __repr__(&self) -> String {
        let inner = self.inner.lock();
        format!(
            "AlsaInput('{}', rate={}, channels={})",
            inner.name(),
            inner.rate(),
            inner.channels()
        )
    }
}

/// Play audio samples on an ALSA device
#[pyclass(name = "AlsaOutput", module = "pcmframe_audio")]
pub struct PyAlsaOutput {
    inner: Mutex<AlsaOutput>,
}

#[pymethods]
impl PyAlsaOutput {
    /// Open a sound device for playback. The device picks the supported rate
    /// nearest to `rate`.
    #[new]
    #[pyo3(signature = (
        pcm_name = DEFAULT_PCM_NAME.to_string(),
        rate = DEFAULT_RATE,
        channels = DEFAULT_CHANNELS,
        periods = DEFAULT_PERIODS,
        frames = DEFAULT_FRAMES
    ))]
    fn new(
        py: Python<'_>,
        pcm_name: String,
        rate: u32,
        channels: u32,
        periods: u32,
        frames: usize,
    ) -> PyResult<Self> {
        let config = PcmConfig::new(pcm_name, rate, channels).with_buffer(periods, frames);
        let inner = py.allow_threads(|| AlsaOutput::open(&config))?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    /// Write an int16 array of shape (samples, channels); blocks until there
    /// is room in the output buffer. Returns `frame`.
    fn write<'py>(
        &self,
        py: Python<'py>,
        frame: Bound<'py, PyUntypedArray>,
    ) -> PyResult<Bound<'py, PyUntypedArray>> {
        let channels = self.inner.lock().channels();
        check_layout(&sample_type(&frame), frame.shape(), channels)?;
        let samples = frame
            .downcast::<PyArray2<i16>>()?
            .readonly()
            .as_array()
            .to_owned();
        py.allow_threads(|| self.inner.lock().write(samples.view()))?;
        Ok(frame)
    }

    /// Write interleaved little-endian bytes
    fn write_bytes(&self, py: Python<'_>, data: &[u8]) -> PyResult<()> {
        Ok(py.allow_threads(|| self.inner.lock().write_bytes(data))?)
    }

    #[getter]
    fn rate(&self) -> u32 {
        self.inner.lock().rate()
    }

    #[getter]
    fn channels(&self) -> u32 {
        self.inner.lock().channels()
    }

    fn close(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf.inner.lock().close();
        slf
    }

    /// Drop the content of the output buffer; call `prepare` to play again
    #[pyo3(name = "drop")]
    fn drop_buffer(slf: PyRef<'_, Self>) -> PyResult<PyRef<'_, Self>> {
        slf.inner.lock().drop_buffer()?;
        Ok(slf)
    }

    /// Wait until the output buffer has been played
    fn drain(slf: PyRef<'_, Self>) -> PyResult<PyRef<'_, Self>> {
        let py = slf.py();
        let inner = &slf.inner;
        py.allow_threads(|| inner.lock().drain())?;
        Ok(slf)
    }

    /// Frames that can be written to the output buffer
    fn avail(&self) -> PyResult<usize> {
        Ok(self.inner.lock().avail()?)
    }

    /// Frames left to play
    fn delay(&self) -> PyResult<i64> {
        Ok(self.inner.lock().delay()?)
    }

    fn prepare(slf: PyRef<'_, Self>) -> PyResult<PyRef<'_, Self>> {
        slf.inner.lock().prepare()?;
        Ok(slf)
    }

    /// Wait up to `seconds` for room in the buffer; returns False on timeout
    fn wait(&self, py: Python<'_>, seconds: f64) -> PyResult<bool> {
        Ok(py.allow_threads(|| self.inner.lock().wait(seconds))?)
    }

    fn __repr__(&self) -> String {
        let inner = self.inner.lock();
        format!(
            "AlsaOutput('{}', rate={}, channels={})",
            inner.name(),
            inner.rate(),
            inner.channels()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sync<T: Send + Sync>() {}

    #[test]
    fn test_classes_are_shareable_between_threads() {
        assert_sync::<PyAlsaInput>();
        assert_sync::<PyAlsaOutput>();
    }
}
