//! Capture what was played through a memory loopback device

use ndarray::{array, Array2, ArrayD, IxDyn};
use pcmframe_audio::{
    frame_from_bytes, AudioError, DeviceFault, MemoryPcm, PcmConfig, PcmInput, PcmOutput,
    SampleArray,
};

fn loopback(channels: u32, frames: usize) -> (PcmInput<MemoryPcm>, PcmOutput<MemoryPcm>) {
    let config = PcmConfig::new("loopback", 44_100, channels).with_buffer(4, frames);
    let (capture, playback) = MemoryPcm::loopback(&config).expect("Failed to open loopback");
    (
        PcmInput::from_device(capture).unwrap(),
        PcmOutput::from_device(playback).unwrap(),
    )
}

#[test]
fn test_played_frames_are_captured() {
    let (mut input, mut output) = loopback(2, 256);
    let wave = Array2::from_shape_fn((100, 2), |(i, c)| (i as i16) * if c == 0 { 1 } else { -1 });

    output.write(wave.view()).unwrap();
    assert_eq!(input.delay().unwrap(), 100);

    let captured = input.read(100).unwrap();
    assert_eq!(captured, wave);
    assert_eq!(output.avail().unwrap(), 256);
}

#[test]
fn test_byte_path_matches_array_path() {
    let (mut input, mut output) = loopback(2, 64);
    let frame = array![[1i16, 2], [3, 4], [-5, -6]];

    output.write_array(&SampleArray::from(frame.clone())).unwrap();
    let bytes = input.read_bytes(3).unwrap();
    assert_eq!(bytes.len(), 2 * frame.len());

    output.write_bytes(&bytes).unwrap();
    assert_eq!(frame_from_bytes(&bytes, 2).unwrap(), frame);
    assert_eq!(input.read(3).unwrap(), frame);
}

#[test]
fn test_rejected_frames_never_reach_the_device() {
    let (mut input, mut output) = loopback(2, 64);

    let wrong_type = SampleArray::F64(ArrayD::zeros(IxDyn(&[4, 2])));
    let wrong_dims = SampleArray::I16(ArrayD::zeros(IxDyn(&[2, 4, 2])));
    let wrong_channels = SampleArray::I16(ArrayD::zeros(IxDyn(&[4, 1])));

    for array in [&wrong_type, &wrong_dims, &wrong_channels] {
        assert!(matches!(
            output.write_array(array),
            Err(AudioError::InvalidFrame(_))
        ));
    }
    assert_eq!(input.avail().unwrap(), 0);
}

#[test]
fn test_streaming_in_periods() {
    let (mut input, mut output) = loopback(1, 32);
    let period = Array2::from_shape_fn((8, 1), |(i, _)| i as i16);

    // Keep the buffer from filling by reading each period back
    for _ in 0..20 {
        output.write(period.view()).unwrap();
        assert!(input.wait(0.1).unwrap());
        assert_eq!(input.read(8).unwrap(), period);
    }
    assert!(!input.wait(0.0).unwrap());
}

#[test]
fn test_xrun_on_both_sides() {
    let config = PcmConfig::new("loopback", 8_000, 1).with_buffer(2, 16);
    let (capture, playback) = MemoryPcm::loopback(&config).unwrap();
    let handle = capture.handle();
    let mut input = PcmInput::from_device(capture).unwrap();
    let mut output = PcmOutput::from_device(playback).unwrap();

    handle.inject_fault(DeviceFault::xrun());
    output.write(array![[1i16], [2]].view()).unwrap();
    handle.inject_fault(DeviceFault::suspended());
    assert_eq!(input.read(2).unwrap(), array![[1i16], [2]]);
    assert_eq!(handle.recoveries(), 2);
}

#[test]
fn test_closing_one_side_keeps_the_other() {
    let (mut input, mut output) = loopback(1, 16);
    output.write(array![[7i16]].view()).unwrap();
    output.close();
    assert!(!output.is_open());
    assert_eq!(input.read(1).unwrap(), array![[7i16]]);
}
