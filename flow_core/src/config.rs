//! Configuration file support for Flowtimer.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/flowtimer/config.toml`.

use crate::runner::RunnerConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub timer: TimerConfig,

    #[serde(default)]
    pub audio: AudioConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Countdown configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Milliseconds per countdown second
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

/// Sound and speech preferences handed to listeners
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enable_tts: bool,

    #[serde(default = "default_tts_language")]
    pub tts_language: String,

    #[serde(default = "default_true")]
    pub enable_sound_effects: bool,

    #[serde(default = "default_completion_sound")]
    pub completion_sound: String,

    /// 0.0 to 1.0
    #[serde(default = "default_sound_volume")]
    pub sound_volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enable_tts: true,
            tts_language: default_tts_language(),
            enable_sound_effects: true,
            completion_sound: default_completion_sound(),
            sound_volume: default_sound_volume(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("flowtimer")
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_tts_language() -> String {
    "en-US".into()
}

fn default_completion_sound() -> String {
    "ding".into()
}

fn default_sound_volume() -> f32 {
    0.7
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.check()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("flowtimer").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values the runner cannot use
    fn check(&self) -> Result<()> {
        if self.timer.tick_millis == 0 {
            return Err(Error::Config("timer.tick_millis must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.audio.sound_volume) {
            return Err(Error::Config(format!(
                "audio.sound_volume {} outside 0.0..=1.0",
                self.audio.sound_volume
            )));
        }
        Ok(())
    }

    /// Runner parameters derived from this configuration
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            tick_interval: Duration::from_millis(self.timer.tick_millis),
        }
    }

    /// Directory holding the workout library
    pub fn library_dir(&self) -> PathBuf {
        self.data.data_dir.join("workouts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timer.tick_millis, 1000);
        assert!(config.audio.enable_tts);
        assert_eq!(config.audio.tts_language, "en-US");
        assert_eq!(config.runner_config().tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.timer.tick_millis = 250;
        config.audio.enable_sound_effects = false;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.timer.tick_millis, 250);
        assert!(!loaded.audio.enable_sound_effects);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[audio]
enable_tts = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(!config.audio.enable_tts);
        assert!(config.audio.enable_sound_effects); // default
        assert_eq!(config.timer.tick_millis, 1000); // default
    }

    #[test]
    fn test_rejects_zero_tick() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[timer]\ntick_millis = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
