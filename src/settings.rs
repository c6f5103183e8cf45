//! Arena settings with persistence
//!
//! Settings are saved to `~/.config/armory/settings.toml`

use std::fs;
use std::path::PathBuf;

use armory_core::TimeConfig;
use armory_weapons::TracerSettings;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All arena settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorySettings {
    pub time: TimeConfig,
    pub tracer: TracerSettings,
    pub run: RunSettings,
}

impl ArmorySettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("armory"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Whether a settings file is already on disk
    pub fn exists() -> bool {
        Self::settings_path().is_some_and(|path| path.exists())
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("settings.toml");

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Scripted arena run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Seed for spread sampling
    pub seed: u64,
    /// Catalog to load instead of the built-in one (`.toml` or `.json`)
    pub catalog_path: Option<PathBuf>,
    /// Simulated seconds spent on each weapon
    pub seconds_per_weapon: f32,
    /// Level every slot starts at
    pub start_level: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            catalog_path: None,
            seconds_per_weapon: 4.0,
            start_level: 1,
        }
    }
}
