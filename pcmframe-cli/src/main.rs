//! pcmframe - record, play and inspect ALSA PCM devices

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use pcmframe_audio::{list_devices, AlsaInput, AlsaOutput, Direction, PcmConfig, PcmDevice};
use pcmframe_cli::config::{CliConfig, Overrides};
use pcmframe_cli::tone::{check_frequency, periods_for, sine_period};
use pcmframe_cli::wav::{read_wav, WavSink};

#[derive(Parser)]
#[command(name = "pcmframe", version, about = "Record, play and inspect ALSA PCM devices")]
struct Cli {
    /// Configuration file (default: <config dir>/pcmframe/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DeviceArgs {
    /// PCM device name
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Desired sample rate in Hz
    #[arg(short, long, global = true)]
    rate: Option<u32>,

    /// Number of channels
    #[arg(short, long, global = true)]
    channels: Option<u32>,

    /// Number of periods in the device buffer
    #[arg(long, global = true)]
    periods: Option<u32>,

    /// Device buffer size in frames
    #[arg(long, global = true)]
    frames: Option<usize>,
}

impl From<DeviceArgs> for Overrides {
    fn from(args: DeviceArgs) -> Self {
        Self {
            pcm_name: args.device,
            rate: args.rate,
            channels: args.channels,
            periods: args.periods,
            frames: args.frames,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List PCM devices
    Devices {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record from the capture device into a WAV file
    Record {
        /// Duration in seconds
        #[arg(short, long, default_value_t = 3.0)]
        seconds: f64,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Play a 16-bit WAV file
    Play {
        file: PathBuf,
    },

    /// Play a sine tone
    Tone {
        /// Frequency in Hz
        #[arg(short, long, default_value_t = 400.0)]
        frequency: f64,

        /// Duration in seconds
        #[arg(short, long, default_value_t = 3.0)]
        seconds: f64,

        /// Amplitude between 0 and 1
        #[arg(short, long, default_value_t = 1.0)]
        amplitude: f64,
    },

    /// Open a device and print its negotiated parameters as JSON
    Status {
        /// Inspect the capture device instead of the playback device
        #[arg(long)]
        capture: bool,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Serialize)]
struct DeviceStatus {
    name: String,
    direction: Direction,
    rate: u32,
    channels: u32,
    buffer_size: usize,
    avail: usize,
    delay: i64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply(&cli.device.into());

    match cli.command {
        Command::Devices { json } => devices(json),
        Command::Record { seconds, output } => record(&config.capture, seconds, &output),
        Command::Play { file } => play(&config.playback, &file),
        Command::Tone {
            frequency,
            seconds,
            amplitude,
        } => tone(&config.playback, frequency, seconds, amplitude),
        Command::Status { capture } => status(&config, capture),
        Command::InitConfig { force } => init_config(&config, force),
    }
}

fn devices(json: bool) -> Result<()> {
    let devices = list_devices()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(78));
    println!("PCM Devices:");
    println!("{}\n", "=".repeat(78));

    for device in devices {
        let direction = device
            .direction
            .map(|d| d.to_string())
            .unwrap_or_else(|| "capture/playback".to_string());
        println!("{}", device.name);
        println!("     Direction: {}", direction);
        if let Some(description) = device.description {
            println!("     {}\n", description.replace('\n', "\n     "));
        }
    }

    println!("{}", "=".repeat(78));
    Ok(())
}

fn record(config: &PcmConfig, seconds: f64, output: &Path) -> Result<()> {
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("Recording duration must be positive (was {})", seconds);
    }

    let mut microphone = AlsaInput::open(config)?;
    let rate = microphone.rate();
    let total = (seconds * rate as f64).round() as usize;
    let chunk = (rate as usize / 10).max(1);

    info!(
        "Recording {:.2}s from \"{}\" ({} Hz, {} channel(s)) to {}",
        seconds,
        microphone.name(),
        rate,
        microphone.channels(),
        output.display()
    );

    let mut sink = WavSink::create(output, rate, microphone.channels())?;
    while sink.frames() < total {
        let samples = chunk.min(total - sink.frames());
        let frame = microphone.read(samples)?;
        sink.append(frame.view())?;
    }
    microphone.close();
    let frames = sink.frames();
    sink.finalize()?;

    info!("Captured {} frames ({:.2}s)", frames, frames as f64 / rate as f64);
    Ok(())
}

fn play(config: &PcmConfig, file: &Path) -> Result<()> {
    let clip = read_wav(file)?;
    let config = clip.playback_config(config)?;

    let mut speaker = AlsaOutput::open(&config)?;
    if speaker.rate() != clip.rate {
        warn!(
            "{} is recorded at {} Hz but the device plays at {} Hz",
            file.display(),
            clip.rate,
            speaker.rate()
        );
    }

    info!(
        "Playing {} ({} frames) on \"{}\"",
        file.display(),
        clip.frame.nrows(),
        speaker.name()
    );

    let chunk = speaker
        .device()
        .map(|device| device.buffer_size())
        .unwrap_or(config.frames)
        .max(1);
    for block in clip.frame.axis_chunks_iter(ndarray::Axis(0), chunk) {
        speaker.write(block)?;
    }
    speaker.drain()?;
    Ok(())
}

fn tone(config: &PcmConfig, frequency: f64, seconds: f64, amplitude: f64) -> Result<()> {
    check_frequency(frequency)?;

    let mut speaker = AlsaOutput::open(config)?;
    let wave = sine_period(speaker.rate(), speaker.channels(), frequency, amplitude);
    let repeats = periods_for(seconds, speaker.rate(), wave.nrows());

    info!(
        "Playing {} Hz for {:.2}s on \"{}\"",
        frequency,
        seconds,
        speaker.name()
    );

    for _ in 0..repeats {
        speaker.write(wave.view())?;
    }
    speaker.drain()?;
    Ok(())
}

fn status(config: &CliConfig, capture: bool) -> Result<()> {
    let status = if capture {
        let mut input = AlsaInput::open(&config.capture)?;
        let buffer_size = input.device().map(|d| d.buffer_size()).unwrap_or_default();
        DeviceStatus {
            name: input.name().to_string(),
            direction: Direction::Capture,
            rate: input.rate(),
            channels: input.channels(),
            buffer_size,
            avail: input.avail()?,
            delay: input.delay()?,
        }
    } else {
        let mut output = AlsaOutput::open(&config.playback)?;
        let buffer_size = output.device().map(|d| d.buffer_size()).unwrap_or_default();
        DeviceStatus {
            name: output.name().to_string(),
            direction: Direction::Playback,
            rate: output.rate(),
            channels: output.channels(),
            buffer_size,
            avail: output.avail()?,
            delay: output.delay()?,
        }
    };

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn init_config(config: &CliConfig, force: bool) -> Result<()> {
    if config.config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config.config_path.display()
        );
    }
    config.save()?;
    info!("Wrote {}", config.config_path.display());
    Ok(())
}
