use std::io::{BufRead, IsTerminal};
use std::path::Path;

use secrecy::SecretString;
use tracing::info;

use guestpass_config::{Config, KEY_SECRET_ENV};
use guestpass_core::Credentials;

use crate::cli::SetKeyArgs;
use crate::error::CliError;

pub fn handle(args: SetKeyArgs, config_path: &Path, config: &Config) -> Result<(), CliError> {
    let secrets = config
        .secret_provider()
        .map_err(|e| CliError::config(config_path, &e))?;

    let key_secret = match std::env::var(KEY_SECRET_ENV) {
        Ok(secret) => secret,
        Err(_) => read_secret()?,
    };
    let key_secret = key_secret.trim().to_owned();
    if key_secret.is_empty() {
        return Err(CliError::Credentials {
            message: "the key secret is empty".into(),
        });
    }

    let credentials = Credentials {
        key_id: args.key_id,
        key_secret: SecretString::from(key_secret),
    };
    secrets
        .store(&credentials)
        .map_err(|e| CliError::startup(config_path, e))?;

    info!(key_id = %credentials.key_id, store = ?config.secrets.store, "API key stored");
    println!("API key '{}' stored in the {:?} store", credentials.key_id, config.secrets.store);
    Ok(())
}

/// Prompt without echo on a terminal, else take the first line of stdin.
fn read_secret() -> Result<String, CliError> {
    if std::io::stdin().is_terminal() {
        return Ok(rpassword::prompt_password("Key secret: ")?);
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
