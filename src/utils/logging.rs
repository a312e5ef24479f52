//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` fmt subscriber from [`LoggingConfig`].
//! `RUST_LOG` takes precedence over the configured level when set.

use crate::config::LoggingConfig;
use crate::error::{GatewayError, Result};
use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter: `RUST_LOG` if present, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()))
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Console,
    File(&'a str),
    ConsoleAndFile(&'a str),
}

/// Resolve the outputs requested by `config`. A file without a path falls
/// back to the console; validation reports that combination separately.
pub fn log_target(config: &LoggingConfig) -> LogTarget<'_> {
    match (config.log_to_file, config.log_file_path.as_deref()) {
        (true, Some(path)) if config.log_to_console => LogTarget::ConsoleAndFile(path),
        (true, Some(path)) => LogTarget::File(path),
        _ => LogTarget::Console,
    }
}

fn open_log_file(path: &str) -> Result<Mutex<File>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Mutex::new)
        .map_err(|e| GatewayError::ConfigError(format!("Failed to open log file: {e}")))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let target = log_target(config);
    let builder = fmt()
        .with_env_filter(env_filter(config))
        .with_target(true)
        .with_ansi(target == LogTarget::Console);

    let installed = match target {
        LogTarget::Console if config.json_format => builder.json().try_init(),
        LogTarget::Console => builder.try_init(),
        LogTarget::File(path) => {
            let builder = builder.with_writer(open_log_file(path)?);
            if config.json_format {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        LogTarget::ConsoleAndFile(path) => {
            let builder = builder.with_writer(std::io::stdout.and(open_log_file(path)?));
            if config.json_format {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
    };

    installed.map_err(|e| GatewayError::ConfigError(format!("Failed to install logger: {e}")))?;
    tracing::info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    Ok(())
}
