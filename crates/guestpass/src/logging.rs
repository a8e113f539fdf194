//! Tracing setup: a log file for the service, plus stderr when a human
//! is watching.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::CliError;

pub const LOG_FILE_NAME: &str = "guestpass.log";

pub fn log_file(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Install the global subscriber. The returned guard must be held until
/// exit so buffered lines reach the file.
pub fn init(log_dir: &Path, log_level: &str, verbosity: u8) -> Result<WorkerGuard, CliError> {
    let level = match verbosity {
        0 => log_level,
        1 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over both the config file and -v.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    std::fs::create_dir_all(log_dir).map_err(|source| CliError::LogDir {
        path: log_dir.display().to_string(),
        source,
    })?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(log_dir)
        .map_err(|e| CliError::LogDir {
            path: log_dir.display().to_string(),
            source: std::io::Error::other(e),
        })?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = std::io::stderr().is_terminal().then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true),
        )
        .with(stderr_layer)
        .init();

    Ok(guard)
}
