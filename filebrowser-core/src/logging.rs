//! Structured JSON logging to rolling files.
//!
//! `init_logging` installs a global `tracing` subscriber: an `EnvFilter`
//! (`RUST_LOG` wins over the configured level) feeding a JSON `fmt` layer that
//! writes through a non-blocking `tracing_appender` rolling file. Keep the
//! returned `WorkerGuard` alive for as long as logs should be flushed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    pub log_level: String,
    pub max_log_files: usize,
    pub rotation: LogRotation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,
    Hourly,
    Daily,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: "filebrowser".to_string(),
            log_level: "info".to_string(),
            max_log_files: 10,
            rotation: LogRotation::Daily,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Invalid log directory: {0}")]
    InvalidLogDirectory(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

fn validate_config(config: &LoggerConfig) -> Result<(), LoggingError> {
    if config.log_file_prefix.trim().is_empty() {
        return Err(LoggingError::ConfigError(
            "log_file_prefix must not be empty".to_string(),
        ));
    }

    if config.max_log_files == 0 {
        return Err(LoggingError::ConfigError(
            "max_log_files must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn setup_log_directory(dir: &Path) -> Result<(), LoggingError> {
    if dir.exists() && !dir.is_dir() {
        return Err(LoggingError::InvalidLogDirectory(dir.display().to_string()));
    }

    std::fs::create_dir_all(dir)?;
    Ok(())
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|e| LoggingError::ConfigError(e.to_string())),
    }
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LoggerConfig) -> Result<WorkerGuard, LoggingError> {
    validate_config(config)?;
    setup_log_directory(&config.log_dir)?;

    let rotation = match config.rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
    };

    let file_appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(config.log_file_prefix.as_str())
        .filename_suffix("jsonl")
        .max_log_files(config.max_log_files)
        .build(&config.log_dir)
        .map_err(|e| LoggingError::ConfigError(e.to_string()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(build_filter(&config.log_level)?)
        .with(json_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(guard)
}
