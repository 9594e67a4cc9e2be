use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::RecomputePolicy;

impl std::fmt::Display for AudioSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sample Rate: {}", self.sample_rate)?;
        writeln!(f, "Block Size: {}", self.block_size)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Used when no stream dictates a rate, e.g. for response plots.
    pub sample_rate: u32,
    pub block_size: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub recompute: RecomputePolicy,
    pub response_points: usize,
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "------------------------------")?;

        writeln!(f, "Audio Settings:")?;
        writeln!(f, "{}", self.audio)?;

        writeln!(f, "Settings:")?;
        writeln!(f, "Coefficient Recompute: {:?}", self.recompute)?;
        writeln!(f, "Response Points: {}", self.response_points)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio: AudioSettings::default(),
            recompute: RecomputePolicy::default(),
            response_points: 200,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path();

        if settings_path.exists() {
            Self::load_from(&settings_path)
        } else {
            info!("No settings file found, using defaults");
            let settings = Self::default();
            // Try to save defaults, but don't fail if we can't
            let _ = settings.save();
            Ok(settings)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("Failed to read settings file")?;
        let settings: Self = serde_json::from_str(&contents).context("Failed to parse settings")?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure the config directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, json).context("Failed to write settings file")?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn get_settings_path() -> PathBuf {
        const SETTINGS_FILENAME: &str = "settings.json";

        // Try to use XDG config directory on Linux
        if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_dir)
                .join("rusteq")
                .join(SETTINGS_FILENAME)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("rusteq")
                .join(SETTINGS_FILENAME)
        } else {
            // Fallback to current directory
            PathBuf::from(".").join(SETTINGS_FILENAME)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_trip_through_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            audio: AudioSettings {
                sample_rate: 96000,
                block_size: 64,
            },
            recompute: RecomputePolicy::OnChange,
            response_points: 512,
        };
        settings.save_to(&path)?;

        assert_eq!(Settings::load_from(&path)?, settings);
        Ok(())
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "recompute": "on_change" }"#)?;

        let settings = Settings::load_from(&path)?;
        assert_eq!(settings.recompute, RecomputePolicy::OnChange);
        assert_eq!(settings.audio, AudioSettings::default());
        assert_eq!(settings.response_points, 200);
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json")?;

        let err = Settings::load_from(&path).expect_err("garbage should not parse");
        assert!(format!("{err:#}").contains("Failed to parse settings"));
        Ok(())
    }

    #[test]
    fn display_lists_values() {
        let text = Settings::default().to_string();
        assert!(text.contains("Sample Rate: 48000"));
        assert!(text.contains("Block Size: 512"));
        assert!(text.contains("EveryBlock"));
    }
}
