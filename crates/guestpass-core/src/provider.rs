// ── Injected capabilities ──
//
// The pipeline never reads files, env vars, or OS secret stores itself.
// Both providers are consulted at the start of every rotation attempt.

use crate::config::{Credentials, RotationConfig};
use crate::error::RotationError;

/// Source of the rotation settings.
pub trait ConfigProvider: Send + Sync {
    /// Load the current settings. Missing required keys are a
    /// [`RotationError::Config`].
    fn load(&self) -> Result<RotationConfig, RotationError>;
}

/// Key/value store holding the controller API key.
pub trait SecretProvider: Send + Sync {
    /// Read the key id and key secret. Absent or empty values are a
    /// [`RotationError::Credential`].
    fn load(&self) -> Result<Credentials, RotationError>;

    /// Replace the stored key id and key secret.
    fn store(&self, credentials: &Credentials) -> Result<(), RotationError>;
}

/// A fixed configuration, for callers that already resolved one.
impl ConfigProvider for RotationConfig {
    fn load(&self) -> Result<RotationConfig, RotationError> {
        Ok(self.clone())
    }
}
