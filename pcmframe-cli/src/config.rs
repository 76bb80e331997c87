//! Configuration management

use anyhow::{Context, Result};
use pcmframe_audio::PcmConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Device parameters given on the command line; each one overrides the
/// value from the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub pcm_name: Option<String>,
    pub rate: Option<u32>,
    pub channels: Option<u32>,
    pub periods: Option<u32>,
    pub frames: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, config: &mut PcmConfig) {
        if let Some(pcm_name) = &self.pcm_name {
            config.pcm_name = pcm_name.clone();
        }
        if let Some(rate) = self.rate {
            config.rate = rate;
        }
        if let Some(channels) = self.channels {
            config.channels = channels;
        }
        if let Some(periods) = self.periods {
            config.periods = periods;
        }
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Path to configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Device used by `record` and `status --capture`
    pub capture: PcmConfig,

    /// Device used by `play`, `tone` and `status`
    pub playback: PcmConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            capture: PcmConfig::default(),
            playback: PcmConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from `path` (or the default location)
    ///
    /// A missing file yields the defaults; nothing is written.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

            let mut config: CliConfig = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;

            config.config_path = config_path;
            Ok(config)
        } else {
            Ok(Self {
                config_path,
                ..Self::default()
            })
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&self.config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply command-line overrides to both devices
    pub fn apply(&mut self, overrides: &Overrides) {
        overrides.apply(&mut self.capture);
        overrides.apply(&mut self.playback);
    }

    /// Get default config path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pcmframe")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.capture, PcmConfig::default());
        assert_eq!(config.config_path, path);
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[playback]\npcm_name = \"hw:0,0\"\nrate = 44100\n\n[capture]\nchannels = 1\n",
        )
        .unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.playback.pcm_name, "hw:0,0");
        assert_eq!(config.playback.rate, 44100);
        assert_eq!(config.playback.channels, 2);
        assert_eq!(config.capture.channels, 1);
        assert_eq!(config.capture.pcm_name, "default:0");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = CliConfig::load(Some(&path)).unwrap();
        config.capture.periods = 4;
        config.save().unwrap();

        let loaded = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.capture.periods, 4);
        assert_eq!(loaded.playback, PcmConfig::default());
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "capture = 3").unwrap();
        let err = CliConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_overrides() {
        let mut config = CliConfig::default();
        config.apply(&Overrides {
            pcm_name: Some("plughw:1".into()),
            channels: Some(1),
            ..Overrides::default()
        });
        assert_eq!(config.capture.pcm_name, "plughw:1");
        assert_eq!(config.playback.channels, 1);
        assert_eq!(config.playback.rate, 48000);
    }
}
