//! Command handlers.

mod check;
mod rotate;
mod run;
mod set_key;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use guestpass_config::{Config, FileConfigProvider};
use guestpass_core::{RotationPipeline, SecretProvider, SecretRandomizer, StateWriter};

use crate::error::CliError;

pub use check::handle as check;
pub use rotate::handle as rotate;
pub use run::handle as run;
pub use set_key::handle as set_key;

/// Validate settings and credentials once, then build the pipeline.
///
/// Anything that would make every attempt fail is rejected here; the
/// pipeline itself re-reads both on each attempt.
fn build_pipeline(config_path: &Path, config: &Config) -> Result<RotationPipeline, CliError> {
    let rotation = config
        .to_rotation_config()
        .map_err(|e| CliError::config(config_path, &e))?;
    debug!(
        controller = %rotation.controller_url,
        guest_login = %rotation.guest_login,
        "configuration validated"
    );

    let secrets = config
        .secret_provider()
        .map_err(|e| CliError::config(config_path, &e))?;
    let key_id = probe_secrets(secrets.as_ref(), config_path)?;
    debug!(key_id = %key_id, "controller API key available");

    let words = config
        .word_list()
        .map_err(|e| CliError::config(config_path, &e))?;
    info!(words = words.len(), "word list loaded");

    Ok(RotationPipeline::new(
        Arc::new(FileConfigProvider::new(config_path)),
        secrets,
        SecretRandomizer::new(words),
        StateWriter::new(config.data_dir()),
    ))
}

/// Confirm the configured secret store answers, without keeping the key.
fn probe_secrets(secrets: &dyn SecretProvider, config_path: &Path) -> Result<String, CliError> {
    secrets
        .load()
        .map(|c| c.key_id)
        .map_err(|e| CliError::startup(config_path, e))
}
