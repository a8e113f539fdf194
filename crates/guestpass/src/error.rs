//! CLI error types with miette diagnostics.
//!
//! Each variant carries the exit code the service manager sees.

use miette::Diagnostic;
use thiserror::Error;

use guestpass_config::ConfigError;
use guestpass_core::{HostError, RotationError};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const ROTATION_FAILED: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const CREDENTIALS: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Startup ──────────────────────────────────────────────────────

    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(guestpass::config),
        help(
            "Check the configuration file or GUESTPASS_* environment variables.\n\
             Config file: {path}"
        )
    )]
    Config { path: String, message: String },

    #[error("Controller API key unavailable: {message}")]
    #[diagnostic(
        code(guestpass::credentials),
        help(
            "Store the key with: guestpass set-key --key-id <ID>\n\
             Or select another store under [secrets] in the configuration."
        )
    )]
    Credentials { message: String },

    #[error("Cannot open log directory {path}")]
    #[diagnostic(
        code(guestpass::log_dir),
        help("Set [paths] log_dir to a writable directory.")
    )]
    LogDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── Runtime ──────────────────────────────────────────────────────

    #[error("Guest password rotation failed")]
    #[diagnostic(
        code(guestpass::rotation_failed),
        help("The previous password stays published. Details are in {log_file}")
    )]
    RotationFailed { log_file: String },

    #[error("The rotation worker stopped without a stop request")]
    #[diagnostic(
        code(guestpass::worker_exited),
        help("Details are in {log_file}")
    )]
    WorkerExited { log_file: String },

    #[error(transparent)]
    #[diagnostic(code(guestpass::host))]
    Host(#[from] HostError),

    #[error("Failed to read the key secret: {0}")]
    #[diagnostic(code(guestpass::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::LogDir { .. } => exit_code::CONFIG,
            Self::Credentials { .. } => exit_code::CREDENTIALS,
            Self::RotationFailed { .. }
            | Self::WorkerExited { .. }
            | Self::Host(_)
            | Self::Io(_) => exit_code::ROTATION_FAILED,
        }
    }

    pub fn config(path: &std::path::Path, err: &ConfigError) -> Self {
        if err.is_credential_error() {
            Self::Credentials {
                message: err.to_string(),
            }
        } else {
            Self::Config {
                path: path.display().to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Startup validation failures from the providers.
    pub fn startup(path: &std::path::Path, err: RotationError) -> Self {
        match err {
            RotationError::Credential { message } => Self::Credentials { message },
            other => Self::Config {
                path: path.display().to_string(),
                message: other.to_string(),
            },
        }
    }
}
