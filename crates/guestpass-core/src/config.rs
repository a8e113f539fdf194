// ── Runtime rotation configuration ──
//
// These types describe *what* to rotate and *how* to reach the controller.
// They never touch disk; `guestpass-config` builds them from TOML + env
// and hands them in through a `ConfigProvider`.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use guestpass_api::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (`verify_tls = false`).
    DangerAcceptInvalid,
}

/// Settings for one rotation attempt.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Controller base URL, without the `/api` suffix.
    pub controller_url: Url,
    /// Login name or email of the guest account to rotate.
    pub guest_login: String,
    /// Wireless network name shown to guests and encoded in the join code.
    pub network_name: String,
    pub tls: TlsVerification,
    /// Per-request timeout for API POSTs.
    pub request_timeout: Duration,
}

impl RotationConfig {
    /// Translate into the API crate's transport settings.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            ..TransportConfig::default()
        }
        .with_request_timeout(self.request_timeout)
    }
}

/// API key used for controller login. Never logged.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub key_id: String,
    pub key_secret: SecretString,
}
