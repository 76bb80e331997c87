//! List ALSA PCM devices

use pcmframe_audio::list_devices;

fn main() -> anyhow::Result<()> {
    println!("PCM Devices on System:");
    for device in list_devices()? {
        let direction = device
            .direction
            .map(|d| d.to_string())
            .unwrap_or_else(|| "capture/playback".to_string());
        println!("{} [{}]", device.name, direction);
        if let Some(description) = device.description {
            for line in description.lines() {
                println!("    {}", line);
            }
        }
    }
    Ok(())
}
