//! In-process PCM device
//!
//! [`MemoryPcm`] keeps the device buffer in a [`FrameRing`] instead of
//! on a sound card. A [`MemoryHandle`] plays the part of the hardware: it
//! feeds captured samples, consumes played ones and injects faults. Two
//! devices opened with [`MemoryPcm::loopback`] share one buffer, so whatever
//! is played can be captured again.
//!
//! The stream state follows ALSA: after `drop_pending` or `drain` the device
//! must be prepared again before any further I/O.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::buffer::FrameRing;
use crate::device::{DeviceFault, Direction, FaultResult, PcmDevice};
use crate::error::Result;
use crate::PcmConfig;

struct MemoryState {
    buffer: FrameRing,
    played: Vec<i16>,
    prepared: bool,
    faults: VecDeque<DeviceFault>,
    recoveries: usize,
}

impl MemoryState {
    fn check_io(&mut self) -> FaultResult<()> {
        if let Some(fault) = self.faults.pop_front() {
            return Err(fault);
        }
        if !self.prepared {
            return Err(DeviceFault::bad_state());
        }
        Ok(())
    }
}

/// PCM device backed by memory
pub struct MemoryPcm {
    name: String,
    direction: Direction,
    rate: u32,
    channels: u32,
    buffer_size: usize,
    shared: Arc<Mutex<MemoryState>>,
}

impl MemoryPcm {
    /// Open a memory device with a buffer of `config.frames` frames
    pub fn open(direction: Direction, config: &PcmConfig) -> Result<Self> {
        config.validate()?;
        let shared = Arc::new(Mutex::new(MemoryState {
            buffer: FrameRing::new(config.frames, config.channels as usize),
            played: Vec::new(),
            prepared: true,
            faults: VecDeque::new(),
            recoveries: 0,
        }));
        debug!(
            "Opened memory PCM \"{}\" for {} ({} Hz, {} channel(s), {} frames)",
            config.pcm_name, direction, config.rate, config.channels, config.frames
        );
        Ok(Self {
            name: config.pcm_name.clone(),
            direction,
            rate: config.rate,
            channels: config.channels,
            buffer_size: config.frames,
            shared,
        })
    }

    pub fn capture(config: &PcmConfig) -> Result<Self> {
        Self::open(Direction::Capture, config)
    }

    pub fn playback(config: &PcmConfig) -> Result<Self> {
        Self::open(Direction::Playback, config)
    }

    /// Open a capture and a playback device sharing one buffer
    ///
    /// Returns `(capture, playback)`.
    pub fn loopback(config: &PcmConfig) -> Result<(Self, Self)> {
        let capture = Self::capture(config)?;
        let playback = Self {
            name: capture.name.clone(),
            direction: Direction::Playback,
            rate: capture.rate,
            channels: capture.channels,
            buffer_size: capture.buffer_size,
            shared: Arc::clone(&capture.shared),
        };
        Ok((capture, playback))
    }

    /// Handle for driving the device from the hardware side
    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            channels: self.channels as usize,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Frames the next transfer could move without blocking
    fn ready(&self, state: &MemoryState) -> usize {
        match self.direction {
            Direction::Capture => state.buffer.queued(),
            Direction::Playback => state.buffer.vacant(),
        }
    }
}

impl PcmDevice for MemoryPcm {
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
        let mut state = self.shared.lock();
        state.check_io()?;
        Ok(state.buffer.pop_frames(buf))
    }

    fn write_interleaved(&mut self, buf: &[i16]) -> FaultResult<usize> {
        let mut state = self.shared.lock();
        state.check_io()?;
        Ok(state.buffer.push_frames(buf))
    }

    fn recover(&mut self, fault: &DeviceFault) -> FaultResult<()> {
        if !fault.is_recoverable() {
            return Err(fault.clone());
        }
        let mut state = self.shared.lock();
        state.prepared = true;
        state.recoveries += 1;
        Ok(())
    }

    fn avail(&mut self) -> FaultResult<usize> {
        let state = self.shared.lock();
        Ok(self.ready(&state))
    }

    fn delay(&mut self) -> FaultResult<i64> {
        Ok(self.shared.lock().buffer.queued() as i64)
    }

    fn prepare(&mut self) -> FaultResult<()> {
        self.shared.lock().prepared = true;
        Ok(())
    }

    fn drop_pending(&mut self) -> FaultResult<()> {
        let mut state = self.shared.lock();
        state.buffer.clear();
        state.prepared = false;
        Ok(())
    }

    fn drain(&mut self) -> FaultResult<()> {
        let mut state = self.shared.lock();
        if self.direction == Direction::Playback {
            let pending = state.buffer.take(usize::MAX);
            state.played.extend_from_slice(&pending);
        }
        state.prepared = false;
        Ok(())
    }

    fn wait(&mut self, _timeout_ms: Option<u32>) -> FaultResult<bool> {
        // Nothing else moves the buffer while we hold the lock, so readiness
        // is decided immediately.
        let state = self.shared.lock();
        Ok(self.ready(&state) > 0)
    }
}

/// Hardware side of a [`MemoryPcm`]
#[derive(Clone)]
pub struct MemoryHandle {
    channels: usize,
    shared: Arc<Mutex<MemoryState>>,
}

impl MemoryHandle {
    /// Push interleaved samples as if they had been recorded
    ///
    /// Returns the number of frames accepted.
    pub fn feed(&self, samples: &[i16]) -> usize {
        self.shared.lock().buffer.push_frames(samples)
    }

    /// Play up to `frames` queued frames; returns the number played
    pub fn consume(&self, frames: usize) -> usize {
        let mut state = self.shared.lock();
        let played = state.buffer.take(frames);
        state.played.extend_from_slice(&played);
        played.len() / self.channels
    }

    /// Take every sample played so far
    pub fn take_played(&self) -> Vec<i16> {
        std::mem::take(&mut self.shared.lock().played)
    }

    /// Frames queued in the device buffer
    pub fn queued(&self) -> usize {
        self.shared.lock().buffer.queued()
    }

    /// Make the next read or write fail with `fault`
    pub fn inject_fault(&self, fault: DeviceFault) {
        self.shared.lock().faults.push_back(fault);
    }

    /// Number of successful recoveries
    pub fn recoveries(&self) -> usize {
        self.shared.lock().recoveries
    }

    pub fn is_prepared(&self) -> bool {
        self.shared.lock().prepared
    }
}
