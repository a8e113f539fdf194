// ── Secret-store adapters ──
//
// Three places the controller API key can live. Every load re-reads the
// store; empty values count as absent.

use std::io::Write;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use guestpass_core::{Credentials, RotationError, SecretProvider};

use crate::ConfigError;

/// Keyring service name the entries are filed under.
pub const KEYRING_SERVICE: &str = "guestpass";
const KEY_ID_ENTRY: &str = "key-id";
const KEY_SECRET_ENTRY: &str = "key-secret";

pub const KEY_ID_ENV: &str = "GUESTPASS_KEY_ID";
pub const KEY_SECRET_ENV: &str = "GUESTPASS_KEY_SECRET";

fn non_empty(
    value: Option<String>,
    store: &'static str,
    name: &str,
) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            store,
            reason: format!("{name} is missing or empty"),
        })
}

// ── Keyring ─────────────────────────────────────────────────────────

/// OS credential store (Keychain, Credential Manager, Secret Service).
#[derive(Debug, Clone)]
pub struct KeyringSecretProvider {
    service: String,
}

impl Default for KeyringSecretProvider {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyringSecretProvider {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry, ConfigError> {
        keyring::Entry::new(&self.service, name).map_err(|e| ConfigError::NoCredentials {
            store: "keyring",
            reason: format!("entry '{name}': {e}"),
        })
    }

    fn read(&self, name: &str) -> Result<String, ConfigError> {
        let value = match self.entry(name)?.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                return Err(ConfigError::NoCredentials {
                    store: "keyring",
                    reason: format!("entry '{name}': {e}"),
                });
            }
        };
        non_empty(value, "keyring", name)
    }

    fn write(&self, name: &str, value: &str) -> Result<(), ConfigError> {
        self.entry(name)?
            .set_password(value)
            .map_err(|e| ConfigError::StoreWrite {
                store: "keyring",
                reason: format!("entry '{name}': {e}"),
            })
    }
}

impl SecretProvider for KeyringSecretProvider {
    fn load(&self) -> Result<Credentials, RotationError> {
        Ok(Credentials {
            key_id: self.read(KEY_ID_ENTRY)?,
            key_secret: SecretString::from(self.read(KEY_SECRET_ENTRY)?),
        })
    }

    fn store(&self, credentials: &Credentials) -> Result<(), RotationError> {
        self.write(KEY_ID_ENTRY, &credentials.key_id)?;
        self.write(KEY_SECRET_ENTRY, credentials.key_secret.expose_secret())?;
        Ok(())
    }
}

// ── Environment ─────────────────────────────────────────────────────

/// `GUESTPASS_KEY_ID` / `GUESTPASS_KEY_SECRET`. Read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretProvider;

impl SecretProvider for EnvSecretProvider {
    fn load(&self) -> Result<Credentials, RotationError> {
        let key_id = non_empty(std::env::var(KEY_ID_ENV).ok(), "env", KEY_ID_ENV)?;
        let key_secret = non_empty(std::env::var(KEY_SECRET_ENV).ok(), "env", KEY_SECRET_ENV)?;
        Ok(Credentials {
            key_id,
            key_secret: SecretString::from(key_secret),
        })
    }

    fn store(&self, _credentials: &Credentials) -> Result<(), RotationError> {
        Err(ConfigError::ReadOnlyStore { store: "env" }.into())
    }
}

// ── Key file ────────────────────────────────────────────────────────

#[derive(Deserialize, Serialize)]
struct KeyFile {
    #[serde(default)]
    key_id: Option<String>,
    #[serde(default)]
    key_secret: Option<String>,
}

/// TOML file with `key_id` and `key_secret`, owner-readable only.
#[derive(Debug, Clone)]
pub struct FileSecretProvider {
    path: PathBuf,
}

impl FileSecretProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Credentials, ConfigError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::NoCredentials {
            store: "file",
            reason: format!("{}: {e}", self.path.display()),
        })?;
        let file: KeyFile = toml::from_str(&raw)?;
        Ok(Credentials {
            key_id: non_empty(file.key_id, "file", "key_id")?,
            key_secret: SecretString::from(non_empty(file.key_secret, "file", "key_secret")?),
        })
    }

    /// Replace the key file. The secret is written to an owner-only temp
    /// file in the same directory, which is then renamed over the target.
    fn write(&self, credentials: &Credentials) -> Result<(), ConfigError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let body = toml::to_string_pretty(&KeyFile {
            key_id: Some(credentials.key_id.clone()),
            key_secret: Some(credentials.key_secret.expose_secret().to_owned()),
        })?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        restrict_permissions(tmp.path())?;
        tmp.write_all(body.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl SecretProvider for FileSecretProvider {
    fn load(&self) -> Result<Credentials, RotationError> {
        Ok(self.read()?)
    }

    fn store(&self, credentials: &Credentials) -> Result<(), RotationError> {
        Ok(self.write(credentials)?)
    }
}
