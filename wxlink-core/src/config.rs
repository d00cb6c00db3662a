use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::location::PositionOptions;

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_MAXIMUM_AGE_MS: u64 = 60_000;
pub const API_KEY_ENV: &str = "WXLINK_API_KEY";

/// Where the host thinks it is, and how fresh a fix has to be.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            maximum_age_ms: DEFAULT_MAXIMUM_AGE_MS,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// OpenWeatherMap key, sent as `appid` when present.
    pub api_key: Option<String>,

    pub base_url: String,

    /// Send numeric AppMessage ids instead of key names.
    pub numeric_keys: bool,

    /// Example TOML:
    /// [location]
    /// latitude = 52.37
    /// longitude = 4.89
    pub location: LocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            numeric_keys: false,
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the platform config dir, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            cfg.set_api_key(key);
        }
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxlink", "wxlink")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Blank keys are treated as absent.
    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.api_key = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub fn set_location(&mut self, latitude: f64, longitude: f64) {
        self.location.latitude = Some(latitude);
        self.location.longitude = Some(longitude);
    }

    /// Configured coordinates, validated.
    pub fn coordinates(&self) -> Result<(f64, f64)> {
        let (Some(lat), Some(lon)) = (self.location.latitude, self.location.longitude) else {
            return Err(anyhow!(
                "No location configured.\n\
                 Hint: run `wxlink configure` or pass --lat/--lon."
            ));
        };
        validate_coordinates(lat, lon)?;
        Ok((lat, lon))
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_millis(self.location.timeout_ms),
            maximum_age: Duration::from_millis(self.location.maximum_age_ms),
        }
    }
}

pub fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(anyhow!("Latitude {lat} is outside -90..=90"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(anyhow!("Longitude {lon} is outside -180..=180"));
    }
    Ok(())
}
