use thiserror::Error;

/// Top-level error type for the `guestpass-api` crate.
///
/// Covers every failure mode of a single controller call: transport,
/// HTTP status, body parsing, and the controller's in-band business errors.
/// `guestpass-core` maps these into per-operation rotation errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Key login was rejected or returned no usable session cookie.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error during {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status.
    #[error("{operation} returned HTTP {status}: {body_preview}")]
    Status {
        operation: &'static str,
        status: u16,
        body_preview: String,
    },

    // ── Controller API ──────────────────────────────────────────────
    /// Business error reported in-band: HTTP 200 with a non-empty `error` field.
    #[error("{operation} rejected by controller: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    /// The response parsed, but a required field was absent or empty.
    #[error("{operation} response is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    /// No guest account in the retrieved page matched the login or email.
    #[error("Guest account '{login}' not found among the first {scanned} guest users")]
    GuestNotFound { login: String, scanned: usize },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error during {operation}: {message}")]
    Deserialization {
        operation: &'static str,
        message: String,
        body: String,
    },
}

impl Error {
    /// HTTP status associated with this error, if the controller answered.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
