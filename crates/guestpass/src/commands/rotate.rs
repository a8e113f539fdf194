use std::path::Path;

use guestpass_config::Config;

use crate::error::CliError;
use crate::logging;

/// One attempt, the way a cron job or a manual retry runs it.
pub async fn handle(config_path: &Path, config: &Config) -> Result<(), CliError> {
    let pipeline = super::build_pipeline(config_path, config)?;

    if pipeline.run_once().await {
        println!(
            "Guest password rotated; state written to {}",
            pipeline.writer().state_path().display()
        );
        Ok(())
    } else {
        Err(CliError::RotationFailed {
            log_file: logging::log_file(&config.log_dir()).display().to_string(),
        })
    }
}
