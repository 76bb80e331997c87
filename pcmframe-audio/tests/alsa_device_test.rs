//! Tests against a real sound card
#![cfg(feature = "alsa-backend")]

use ndarray::Array2;
use pcmframe_audio::{AlsaInput, AlsaOutput, PcmConfig};

#[test]
#[ignore = "Requires an ALSA capture device"]
fn test_capture_from_default_device() {
    let mut microphone =
        AlsaInput::open(&PcmConfig::new("default", 44_100, 2)).expect("Failed to open capture");
    assert!(microphone.rate() > 0);

    let data = microphone.read(4410).expect("Failed to read");
    assert_eq!(data.dim(), (4410, 2));

    microphone.close();
    assert!(microphone.read(1).is_err());
}

#[test]
#[ignore = "Requires an ALSA playback device"]
fn test_play_silence_on_default_device() {
    let mut speaker =
        AlsaOutput::open(&PcmConfig::new("default", 44_100, 2)).expect("Failed to open playback");
    let silence = Array2::<i16>::zeros((speaker.rate() as usize / 10, 2));

    speaker.write(silence.view()).expect("Failed to write");
    assert!(speaker.delay().unwrap() >= 0);
    speaker.drain().expect("Failed to drain");

    speaker.prepare().unwrap();
    speaker.write(silence.view()).unwrap();
    speaker.drop_buffer().unwrap();
    speaker.prepare().unwrap();
}
