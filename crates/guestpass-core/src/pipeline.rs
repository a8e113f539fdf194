// ── Rotation pipeline ──
//
// One attempt walks Start → Authenticated → TenantResolved →
// AccountResolved → SecretGenerated → Updated → Persisted → Succeeded.
// Any failure ends the attempt in Failed. A completed remote update is
// never rolled back, so a persistence failure after it still reports
// failure while the controller already holds the new password.

use std::sync::Arc;

use chrono::Utc;
use strum::Display;
use tracing::{debug, error, info, warn};

use guestpass_api::ControllerClient;

use crate::config::TlsVerification;
use crate::error::RotationError;
use crate::provider::{ConfigProvider, SecretProvider};
use crate::secret::SecretRandomizer;
use crate::state::{RotationResult, StateWriter};

/// Position of an attempt in the rotation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RotationStage {
    Start,
    Authenticated,
    TenantResolved,
    AccountResolved,
    SecretGenerated,
    Updated,
    Persisted,
    Succeeded,
    Failed,
}

/// Drives the controller client, the randomizer and the state writer
/// through a single rotation attempt.
pub struct RotationPipeline {
    config: Arc<dyn ConfigProvider>,
    secrets: Arc<dyn SecretProvider>,
    randomizer: SecretRandomizer,
    writer: StateWriter,
}

impl RotationPipeline {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        secrets: Arc<dyn SecretProvider>,
        randomizer: SecretRandomizer,
        writer: StateWriter,
    ) -> Self {
        Self {
            config,
            secrets,
            randomizer,
            writer,
        }
    }

    pub fn writer(&self) -> &StateWriter {
        &self.writer
    }

    /// Run one attempt and report only whether it succeeded.
    ///
    /// Every failure is logged here with its stage, operation and HTTP
    /// status; nothing propagates past this call.
    pub async fn run_once(&self) -> bool {
        match self.attempt().await {
            Ok(result) => {
                info!(
                    stage = %RotationStage::Succeeded,
                    ssid = %result.network_name,
                    guest_login = %result.guest_login,
                    rotated_at = %result.rotated_at,
                    "guest password rotated"
                );
                true
            }
            Err(e) => {
                error!(
                    stage = %RotationStage::Failed,
                    last_stage = %e.stage(),
                    operation = e.operation(),
                    status = ?e.http_status(),
                    error = %e,
                    "guest password rotation failed"
                );
                false
            }
        }
    }

    /// Run one attempt, returning the typed failure.
    ///
    /// Configuration and credentials are loaded fresh and a new session is
    /// opened every time.
    pub async fn attempt(&self) -> Result<RotationResult, RotationError> {
        let config = self.config.load()?;
        let credentials = self.secrets.load()?;

        if config.tls == TlsVerification::DangerAcceptInvalid {
            warn!("TLS certificate verification is disabled for the controller connection");
        }

        let client = ControllerClient::new(config.controller_url.clone(), &config.transport())
            .map_err(|e| RotationError::Config {
                message: format!("cannot build controller client: {e}"),
            })?;

        let session = client
            .authenticate(&credentials.key_id, &credentials.key_secret)
            .await
            .map_err(|source| RotationError::Auth { source })?;
        debug!(stage = %RotationStage::Authenticated, "rotation progress");

        let tenant = client
            .resolve_tenant(&session)
            .await
            .map_err(|source| RotationError::TenantResolution { source })?;
        debug!(stage = %RotationStage::TenantResolved, tenant_id = %tenant, "rotation progress");

        let account = client
            .find_guest_account(&session, &tenant, &config.guest_login)
            .await
            .map_err(|source| RotationError::GuestNotFound { source })?;
        debug!(stage = %RotationStage::AccountResolved, "rotation progress");

        let password = self.randomizer.generate();
        debug!(stage = %RotationStage::SecretGenerated, "rotation progress");

        client
            .update_guest_password(&session, &tenant, &account, &password)
            .await
            .map_err(|source| RotationError::Update { source })?;
        debug!(stage = %RotationStage::Updated, "rotation progress");

        let result = RotationResult::new(
            config.network_name,
            config.guest_login,
            password,
            Utc::now(),
        );
        self.writer.persist(&result)?;
        debug!(stage = %RotationStage::Persisted, "rotation progress");

        Ok(result)
    }
}

impl std::fmt::Debug for RotationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationPipeline")
            .field("randomizer", &self.randomizer)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}
