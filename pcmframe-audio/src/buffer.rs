//! Ring buffer of interleaved frames

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;

/// Lock-free ring of interleaved `i16` frames
///
/// Backs the device buffer of [`MemoryPcm`](crate::MemoryPcm). Every
/// operation moves whole frames; a trailing partial frame in the input is
/// left alone, the same way ALSA counts transfers in frames.
pub struct FrameRing {
    producer: ringbuf::HeapProd<i16>,
    consumer: ringbuf::HeapCons<i16>,
    channels: usize,
}

impl FrameRing {
    /// Ring holding at most `frames` frames of `channels` samples each
    ///
    /// # Example
    ///
    /// ```
    /// use pcmframe_audio::FrameRing;
    ///
    /// let mut ring = FrameRing::new(1024, 2);
    /// assert_eq!(ring.push_frames(&[1, 2, 3]), 1);
    /// assert_eq!(ring.queued(), 1);
    /// assert_eq!(ring.vacant(), 1023);
    /// ```
    pub fn new(frames: usize, channels: usize) -> Self {
        let rb = HeapRb::<i16>::new(frames * channels);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            channels,
        }
    }

    /// Queue as many whole frames of `samples` as fit; returns the frame count
    pub fn push_frames(&mut self, samples: &[i16]) -> usize {
        let frames = self.vacant().min(samples.len() / self.channels);
        self.producer.push_slice(&samples[..frames * self.channels]) / self.channels
    }

    /// Dequeue whole frames into `output`; returns the frame count
    pub fn pop_frames(&mut self, output: &mut [i16]) -> usize {
        let frames = self.queued().min(output.len() / self.channels);
        self.consumer.pop_slice(&mut output[..frames * self.channels]) / self.channels
    }

    /// Dequeue up to `frames` frames
    pub fn take(&mut self, frames: usize) -> Vec<i16> {
        let mut output = vec![0; self.queued().min(frames) * self.channels];
        let read = self.pop_frames(&mut output);
        output.truncate(read * self.channels);
        output
    }

    /// Frames queued for reading
    pub fn queued(&self) -> usize {
        self.consumer.occupied_len() / self.channels
    }

    /// Frames that can still be queued
    pub fn vacant(&self) -> usize {
        self.producer.vacant_len() / self.channels
    }

    pub fn clear(&mut self) {
        self.consumer.clear();
    }
}
