use std::path::Path;

use guestpass_config::Config;

use crate::error::CliError;
use crate::logging;

/// Validate everything `run` needs and print a summary (never the key).
pub fn handle(config_path: &Path, config: &Config) -> Result<(), CliError> {
    let rotation = config
        .to_rotation_config()
        .map_err(|e| CliError::config(config_path, &e))?;
    let schedule = config
        .rotation_schedule()
        .map_err(|e| CliError::config(config_path, &e))?;
    let words = config
        .word_list()
        .map_err(|e| CliError::config(config_path, &e))?;
    let secrets = config
        .secret_provider()
        .map_err(|e| CliError::config(config_path, &e))?;
    let key_id = super::probe_secrets(secrets.as_ref(), config_path)?;

    println!("Configuration OK ({})", config_path.display());
    println!("  controller:   {}", rotation.controller_url);
    println!("  guest login:  {}", rotation.guest_login);
    println!("  network:      {}", rotation.network_name);
    println!("  tls:          {:?}", rotation.tls);
    println!("  schedule:     {schedule}");
    println!("  word list:    {} words", words.len());
    println!("  data dir:     {}", config.data_dir().display());
    println!("  log file:     {}", logging::log_file(&config.log_dir()).display());
    println!("  api key id:   {key_id} ({:?} store)", config.secrets.store);
    Ok(())
}
