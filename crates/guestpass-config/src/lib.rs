//! Configuration for the guestpass rotation service.
//!
//! One TOML file layered under `GUESTPASS_*` environment variables,
//! translation to `guestpass_core::RotationConfig`, and the secret-store
//! adapters that hold the controller API key.

mod secrets;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use guestpass_core::{
    ConfigProvider, RotationConfig, RotationError, Schedule, SecretProvider, TlsVerification,
    WordList,
};

pub use secrets::{
    EnvSecretProvider, FileSecretProvider, KEY_ID_ENV, KEY_SECRET_ENV, KEYRING_SERVICE,
    KeyringSecretProvider,
};

/// Longest accepted `schedule.every_minutes`: one year.
pub const MAX_EVERY_MINUTES: u64 = 365 * 24 * 60;

/// Prefix of every environment override (`GUESTPASS_SCHEDULE__HOUR=3`).
pub const ENV_PREFIX: &str = "GUESTPASS_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{field}'")]
    Missing { field: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("no credentials in {store} store: {reason}")]
    NoCredentials { store: &'static str, reason: String },

    #[error("cannot write to {store} store: {reason}")]
    StoreWrite { store: &'static str, reason: String },

    #[error("the {store} secret store is read-only")]
    ReadOnlyStore { store: &'static str },

    #[error("failed to serialize key file: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse key file: {0}")]
    KeyFile(#[from] toml::de::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    /// Whether this error is about the API key rather than the settings.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::NoCredentials { .. }
                | Self::StoreWrite { .. }
                | Self::ReadOnlyStore { .. }
                | Self::KeyFile(_)
        )
    }
}

impl From<ConfigError> for RotationError {
    fn from(err: ConfigError) -> Self {
        let message = err.to_string();
        if err.is_credential_error() {
            Self::Credential { message }
        } else {
            Self::Config { message }
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Controller base URL (e.g., "https://agni.example.com").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller_url: Option<String>,

    /// Login name or email of the guest account to rotate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_login: Option<String>,

    /// Wireless network name shown to guests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,

    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// PEM file of a private CA the controller certificate chains to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-request timeout for API calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,

    #[serde(default)]
    pub service: ServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller_url: None,
            guest_login: None,
            network_name: None,
            verify_tls: default_verify_tls(),
            ca_cert: None,
            log_level: default_log_level(),
            timeout_secs: default_timeout_secs(),
            schedule: ScheduleConfig::default(),
            paths: PathsConfig::default(),
            secrets: SecretsConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

fn default_verify_tls() -> bool {
    true
}
fn default_log_level() -> String {
    "info".into()
}
fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Local hour of the daily rotation.
    #[serde(default = "default_hour")]
    pub hour: u32,

    #[serde(default)]
    pub minute: u32,

    /// Rotate every N minutes instead of daily (testing aid).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_minutes: Option<u64>,

    /// Run one rotation as soon as the service starts.
    #[serde(default)]
    pub rotate_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            hour: default_hour(),
            minute: 0,
            every_minutes: None,
            rotate_on_start: false,
        }
    }
}

fn default_hour() -> u32 {
    2
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Where the state document and join-code image are written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Replacement for the embedded word list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_list: Option<PathBuf>,
}

/// Backend holding the controller API key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretStore {
    #[default]
    Keyring,
    Env,
    File,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub store: SecretStore,

    /// Key file for `store = "file"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// How long to wait for the worker after a stop request.
    #[serde(default = "default_join_timeout_secs")]
    pub join_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            join_timeout_secs: default_join_timeout_secs(),
        }
    }
}

fn default_join_timeout_secs() -> u64 {
    15
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "guestpass", "guestpass")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the full Config from defaults, the TOML file, then environment.
///
/// A missing file is not an error; required keys are checked by
/// [`Config::to_rotation_config`].
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config", "key_id", "key_secret"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

impl Config {
    /// Validate and translate into the pipeline's runtime settings.
    pub fn to_rotation_config(&self) -> Result<RotationConfig, ConfigError> {
        let raw_url = required(self.controller_url.as_deref(), "controller_url")?;
        let controller_url = Url::parse(raw_url).map_err(|e| ConfigError::Validation {
            field: "controller_url",
            reason: format!("{raw_url}: {e}"),
        })?;
        if !matches!(controller_url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "controller_url",
                reason: format!("unsupported scheme '{}'", controller_url.scheme()),
            });
        }

        let guest_login = required(self.guest_login.as_deref(), "guest_login")?.to_owned();
        let network_name = required(self.network_name.as_deref(), "network_name")?.to_owned();

        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "timeout_secs",
                reason: "must be at least 1".into(),
            });
        }

        let tls = if !self.verify_tls {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        Ok(RotationConfig {
            controller_url,
            guest_login,
            network_name,
            tls,
            request_timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    /// The rotation trigger: `every_minutes` wins over the daily slot.
    pub fn rotation_schedule(&self) -> Result<Schedule, ConfigError> {
        let ScheduleConfig {
            hour,
            minute,
            every_minutes,
            ..
        } = self.schedule;

        match every_minutes {
            Some(0) => Err(ConfigError::Validation {
                field: "schedule.every_minutes",
                reason: "must be at least 1".into(),
            }),
            Some(minutes) if minutes > MAX_EVERY_MINUTES => Err(ConfigError::Validation {
                field: "schedule.every_minutes",
                reason: format!("{minutes} exceeds {MAX_EVERY_MINUTES} (one year)"),
            }),
            Some(minutes) => Ok(Schedule::Every(Duration::from_secs(minutes.saturating_mul(60)))),
            None if hour > 23 => Err(ConfigError::Validation {
                field: "schedule.hour",
                reason: format!("{hour} is not in 0..=23"),
            }),
            None if minute > 59 => Err(ConfigError::Validation {
                field: "schedule.minute",
                reason: format!("{minute} is not in 0..=59"),
            }),
            None => Ok(Schedule::Daily { hour, minute }),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.paths.data_dir.clone().unwrap_or_else(|| {
            project_dirs().map_or_else(|| PathBuf::from("data"), |d| d.data_dir().join("data"))
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.paths.log_dir.clone().unwrap_or_else(|| {
            project_dirs().map_or_else(
                || PathBuf::from("logs"),
                |d| d.data_local_dir().join("logs"),
            )
        })
    }

    /// The configured word list, or the embedded one.
    pub fn word_list(&self) -> Result<WordList, ConfigError> {
        match self.paths.word_list {
            Some(ref path) => {
                let words = WordList::from_file(path)?;
                if words.is_empty() {
                    tracing::warn!(path = %path.display(), "word list has no usable words");
                }
                Ok(words)
            }
            None => Ok(WordList::embedded()),
        }
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.service.join_timeout_secs)
    }

    /// Build the secret-store adapter selected by `[secrets] store`.
    pub fn secret_provider(&self) -> Result<Arc<dyn SecretProvider>, ConfigError> {
        let provider: Arc<dyn SecretProvider> = match self.secrets.store {
            SecretStore::Keyring => Arc::new(KeyringSecretProvider::default()),
            SecretStore::Env => Arc::new(EnvSecretProvider),
            SecretStore::File => {
                let path = self.secrets.file.clone().ok_or(ConfigError::Missing {
                    field: "secrets.file",
                })?;
                Arc::new(FileSecretProvider::new(path))
            }
        };
        Ok(provider)
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { field })
}

// ── ConfigProvider ──────────────────────────────────────────────────

/// Re-reads the config file and environment on every load.
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigProvider for FileConfigProvider {
    fn load(&self) -> Result<RotationConfig, RotationError> {
        Ok(load_config(&self.path)?.to_rotation_config()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    const MINIMAL: &str = r#"
        controller_url = "https://agni.example.com"
        guest_login = "lobby@example.com"
        network_name = "Lobby Guest"
    "#;

    #[test]
    fn defaults_apply_when_file_is_minimal() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", MINIMAL)?;
            let config = load_config(Path::new("config.toml")).unwrap();

            assert!(config.verify_tls);
            assert_eq!(config.log_level, "info");
            assert_eq!(config.timeout_secs, 15);
            assert_eq!(config.secrets.store, SecretStore::Keyring);
            assert_eq!(
                config.rotation_schedule().unwrap(),
                Schedule::Daily { hour: 2, minute: 0 }
            );

            let rotation = config.to_rotation_config().unwrap();
            assert_eq!(rotation.controller_url.as_str(), "https://agni.example.com/");
            assert_eq!(rotation.tls, TlsVerification::SystemDefaults);
            assert_eq!(rotation.request_timeout, Duration::from_secs(15));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file_including_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", MINIMAL)?;
            jail.set_env("GUESTPASS_NETWORK_NAME", "Cafe");
            jail.set_env("GUESTPASS_VERIFY_TLS", "false");
            jail.set_env("GUESTPASS_SCHEDULE__EVERY_MINUTES", "5");
            jail.set_env("GUESTPASS_KEY_SECRET", "must-not-leak-into-config");

            let config = load_config(Path::new("config.toml")).unwrap();
            let rotation = config.to_rotation_config().unwrap();

            assert_eq!(rotation.network_name, "Cafe");
            assert_eq!(rotation.tls, TlsVerification::DangerAcceptInvalid);
            assert_eq!(
                config.rotation_schedule().unwrap(),
                Schedule::Every(Duration::from_secs(300))
            );
            Ok(())
        });
    }

    #[test]
    fn missing_required_key_is_reported_by_name() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", r#"controller_url = "https://agni.example.com""#)?;
            let err = load_config(Path::new("config.toml"))
                .unwrap()
                .to_rotation_config()
                .unwrap_err();

            assert!(matches!(err, ConfigError::Missing { field: "guest_login" }));
            assert!(!err.is_credential_error());
            Ok(())
        });
    }

    #[test]
    fn absent_file_still_loads_defaults() {
        Jail::expect_with(|_| {
            let config = load_config(Path::new("does-not-exist.toml")).unwrap();
            assert!(config.controller_url.is_none());
            Ok(())
        });
    }

    #[test]
    fn custom_ca_is_used_when_verifying() {
        let config = Config {
            controller_url: Some("https://agni.example.com".into()),
            guest_login: Some("lobby".into()),
            network_name: Some("Lobby".into()),
            ca_cert: Some(PathBuf::from("/etc/guestpass/ca.pem")),
            ..Config::default()
        };
        assert_eq!(
            config.to_rotation_config().unwrap().tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/guestpass/ca.pem"))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config {
            controller_url: Some("ftp://agni.example.com".into()),
            guest_login: Some("lobby".into()),
            network_name: Some("Lobby".into()),
            ..Config::default()
        };
        assert!(matches!(
            config.to_rotation_config(),
            Err(ConfigError::Validation { field: "controller_url", .. })
        ));

        config.schedule.hour = 24;
        assert!(matches!(
            config.rotation_schedule(),
            Err(ConfigError::Validation { field: "schedule.hour", .. })
        ));

        config.schedule.every_minutes = Some(0);
        assert!(config.rotation_schedule().is_err());
    }

    #[test]
    fn every_minutes_is_capped_at_one_year() {
        let mut config = Config::default();

        config.schedule.every_minutes = Some(MAX_EVERY_MINUTES);
        assert_eq!(
            config.rotation_schedule().unwrap(),
            Schedule::Every(Duration::from_secs(MAX_EVERY_MINUTES * 60))
        );

        config.schedule.every_minutes = Some(1_000_000_000_000);
        assert!(matches!(
            config.rotation_schedule(),
            Err(ConfigError::Validation { field: "schedule.every_minutes", .. })
        ));
    }

    #[test]
    fn file_store_requires_a_path() {
        let config = Config {
            secrets: SecretsConfig {
                store: SecretStore::File,
                file: None,
            },
            ..Config::default()
        };
        assert!(matches!(
            config.secret_provider(),
            Err(ConfigError::Missing { field: "secrets.file" })
        ));
    }

    #[test]
    fn config_errors_map_onto_rotation_errors() {
        let config: RotationError = ConfigError::Missing { field: "guest_login" }.into();
        assert!(matches!(config, RotationError::Config { .. }));

        let credential: RotationError = ConfigError::ReadOnlyStore { store: "env" }.into();
        assert!(matches!(credential, RotationError::Credential { .. }));
    }
}
