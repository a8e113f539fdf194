// ── Rotation error types ──
//
// One variant per pipeline step. Remote variants wrap the transport-level
// `guestpass_api::Error` so the log line carries the operation, HTTP status,
// and body preview; the pipeline boundary turns all of them into `false`.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::RotationStage;

/// Failure of a single rotation attempt, named after the step that failed.
#[derive(Debug, Error)]
pub enum RotationError {
    // ── Startup / per-attempt inputs ─────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Credential error: {message}")]
    Credential { message: String },

    // ── Remote steps ─────────────────────────────────────────────────
    #[error("Authentication failed: {source}")]
    Auth {
        #[source]
        source: guestpass_api::Error,
    },

    #[error("Tenant resolution failed: {source}")]
    TenantResolution {
        #[source]
        source: guestpass_api::Error,
    },

    #[error("Guest account lookup failed: {source}")]
    GuestNotFound {
        #[source]
        source: guestpass_api::Error,
    },

    #[error("Guest password update failed: {source}")]
    Update {
        #[source]
        source: guestpass_api::Error,
    },

    // ── Local persistence ────────────────────────────────────────────
    #[error("Failed to persist rotation state to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RotationError {
    /// The last stage the attempt reached before this error.
    pub fn stage(&self) -> RotationStage {
        match self {
            Self::Config { .. } | Self::Credential { .. } | Self::Auth { .. } => {
                RotationStage::Start
            }
            Self::TenantResolution { .. } => RotationStage::Authenticated,
            Self::GuestNotFound { .. } => RotationStage::TenantResolved,
            Self::Update { .. } => RotationStage::SecretGenerated,
            Self::Persistence { .. } => RotationStage::Updated,
        }
    }

    /// Name of the failing operation, for structured log fields.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Config { .. } => "load_config",
            Self::Credential { .. } => "load_credentials",
            Self::Auth { .. } => "authenticate",
            Self::TenantResolution { .. } => "resolve_tenant",
            Self::GuestNotFound { .. } => "find_guest_account",
            Self::Update { .. } => "update_guest_password",
            Self::Persistence { .. } => "persist_state",
        }
    }

    /// HTTP status of the failing remote call, if the controller answered.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Auth { source }
            | Self::TenantResolution { source }
            | Self::GuestNotFound { source }
            | Self::Update { source } => source.http_status(),
            _ => None,
        }
    }
}

/// Failure to host a service unit.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to spawn worker thread for {name}: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}
