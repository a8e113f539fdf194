use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use guestpass_config::Config;
use guestpass_core::{LogSupervisor, RotationScheduler, ServiceHost, StopHandle};

use crate::error::CliError;
use crate::logging;

/// Host the scheduled rotation until SIGINT or SIGTERM.
pub async fn handle(config_path: &Path, config: &Config) -> Result<(), CliError> {
    let pipeline = super::build_pipeline(config_path, config)?;
    let schedule = config
        .rotation_schedule()
        .map_err(|e| CliError::config(config_path, &e))?;

    let scheduler =
        RotationScheduler::new(pipeline, schedule).rotate_on_start(config.schedule.rotate_on_start);
    let host = ServiceHost::new(scheduler, Arc::new(LogSupervisor))
        .with_join_timeout(config.join_timeout());

    let signals = tokio::spawn(stop_on_signal(host.stop_handle()));
    let exit = host.run().await?;
    signals.abort();

    if !exit.stop_requested {
        return Err(CliError::WorkerExited {
            log_file: logging::log_file(&config.log_dir()).display().to_string(),
        });
    }
    if exit.worker_joined {
        info!("guestpass stopped");
    } else {
        warn!("guestpass stopped with the rotation worker still running");
    }
    Ok(())
}

async fn stop_on_signal(handle: StopHandle) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("interrupt received, stopping"),
        () = terminate => info!("terminate received, stopping"),
    }
    handle.request_stop();
}
