//! Logging and tracing initialization.
//!
//! The global filter sits behind a reload handle so the level can be
//! changed while the engine is running.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::error::{GliderError, GliderResult};

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Verbosity accepted by `set_log_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    None = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Filter directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::None => "off",
            LogLevel::Error => "error",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl TryFrom<i32> for LogLevel {
    type Error = GliderError;

    fn try_from(id: i32) -> Result<Self, GliderError> {
        match id {
            0 => Ok(LogLevel::None),
            1 => Ok(LogLevel::Error),
            2 => Ok(LogLevel::Info),
            3 => Ok(LogLevel::Debug),
            other => Err(GliderError::validation(
                "log level",
                format!("expected 0 (none), 1 (error), 2 (info) or 3 (debug), got {other}"),
            )),
        }
    }
}

impl FromStr for LogLevel {
    type Err = GliderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(LogLevel::None),
            "error" => Ok(LogLevel::Error),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => match other.parse::<i32>() {
                Ok(id) => LogLevel::try_from(id),
                Err(_) => Err(GliderError::validation(
                    "log level",
                    format!("unknown level '{s}'"),
                )),
            },
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.directive())
    }
}

/// Initialize the tracing subscriber with the given configuration.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let (filter, handle) = reload::Layer::new(env_filter);

    let json_layer = config.json.then(|| fmt::layer().json());
    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });

    let mut file_error = None;
    let file_layer = match config.file.as_deref().map(open_log_file) {
        Some(Ok(file)) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        ),
        Some(Err(e)) => {
            file_error = Some(e);
            None
        }
        None => None,
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        FILTER_HANDLE.set(handle).ok();
    }
    if let Some(e) = file_error {
        tracing::warn!(error = %e, path = ?config.file, "Failed to open log file");
    }
}

/// Change the global log level at runtime.
///
/// A no-op when the subscriber was not installed through [`init_logging`].
pub fn set_log_level(level: LogLevel) -> GliderResult<()> {
    match FILTER_HANDLE.get() {
        Some(handle) => {
            handle
                .reload(EnvFilter::new(level.directive()))
                .map_err(|e| GliderError::config(format!("Failed to change log level: {e}")))?;
            tracing::info!(%level, "Log level changed");
            Ok(())
        }
        None => {
            tracing::debug!(%level, "No reloadable subscriber installed, ignoring level change");
            Ok(())
        }
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ids() {
        assert_eq!(LogLevel::try_from(0).unwrap(), LogLevel::None);
        assert_eq!(LogLevel::try_from(3).unwrap(), LogLevel::Debug);
        assert!(LogLevel::try_from(4).unwrap_err().is_validation());
        assert!(LogLevel::try_from(-1).is_err());
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::None);
        assert_eq!("Info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("1".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_set_level_without_subscriber_is_ok() {
        // Tests never call init_logging, so there is no handle to reload.
        assert!(set_log_level(LogLevel::Debug).is_ok());
    }
}
