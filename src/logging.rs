//! Logging setup for the command-line tool.
//!
//! The library only emits `tracing` events; this module installs the
//! subscriber that prints them.
//!
//! - **Console**: stderr, so reports on stdout stay machine-readable
//! - **File**: daily rotating `project-integrity.log`, 10 files retained,
//!   under the platform data directory
//!
//! `RUST_LOG` overrides the level chosen from the verbosity flag.

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/project-integrity/logs`
/// - macOS: `~/Library/Application Support/project-integrity/logs`
/// - Linux: `~/.local/share/project-integrity/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;

    let log_dir = base_dir.join("project-integrity").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Default filter directive for a `-v` count.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initializes console logging, plus file logging when `to_file` is set.
///
/// # Errors
///
/// Returns error if the log directory or file appender can't be created.
pub fn init(verbosity: u8, to_file: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_for_verbosity(verbosity)))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(verbosity > 1)
        .with_writer(std::io::stderr);

    let file_layer = if to_file {
        let log_dir = get_log_dir()?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .max_log_files(10)
            .filename_prefix("project-integrity")
            .filename_suffix("log")
            .build(&log_dir)
            .context("Failed to create log file appender")?;

        Some(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(appender),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
