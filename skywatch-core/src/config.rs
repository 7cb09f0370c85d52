use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::{Coordinates, UnitSystem};

pub const DEFAULT_INTERVAL_SECS: u64 = 15;

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key, shared by the weather and reverse-geocoding
    /// endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub units: UnitSystem,

    /// Seconds between the start of one refresh cycle and the next.
    pub interval_secs: u64,

    /// Whether the user has allowed skywatch to look up this machine's
    /// location. `None` means they have never been asked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_consent: Option<bool>,

    /// Fixed coordinates to use instead of automatic lookup.
    ///
    /// Example TOML:
    /// [location]
    /// latitude = 50.45
    /// longitude = 30.52
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            units: UnitSystem::default(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            location_consent: None,
            location: None,
        }
    }
}

impl Config {
    /// Return the API key, or an error telling the user how to set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `skywatch configure` and enter your API key."
                )
            })
    }

    /// Refresh cadence as a [`Duration`]. A zero value in the file is
    /// lifted to one second so the ticker stays well-formed.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Set/replace the API key.
    pub fn upsert_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Load config from disk, or return the defaults if the file doesn't
    /// exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skywatch", "skywatch")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
