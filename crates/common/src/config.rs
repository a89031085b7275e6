//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GliderError, GliderResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Motion engine settings.
    pub engine: EngineSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Motion engine tuning that is not part of the live movement configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Motion tick period in milliseconds.
    pub tick_ms: u64,

    /// Duration scale: at speed `s` the cursor covers `s * k` pixels per ms.
    pub pixels_per_ms_per_speed: f64,

    /// Preset used as the initial movement configuration ("default", "fast", "smooth").
    pub preset: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "glider_motion=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path. Events are appended.
    pub file: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            pixels_per_ms_per_speed: 0.1,
            preset: "default".to_string(),
        }
    }
}

impl EngineSettings {
    /// Reject settings the motion loop cannot run with.
    pub fn validate(&self) -> GliderResult<()> {
        if self.tick_ms == 0 {
            return Err(GliderError::config("engine.tick_ms must be at least 1"));
        }
        if !self.pixels_per_ms_per_speed.is_finite() || self.pixels_per_ms_per_speed <= 0.0 {
            return Err(GliderError::config(format!(
                "engine.pixels_per_ms_per_speed must be positive, got {}",
                self.pixels_per_ms_per_speed
            )));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Errors are returned, not swallowed.
    pub fn load_from(path: &Path) -> GliderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> GliderResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> GliderResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("glider").join("config.json")
}
