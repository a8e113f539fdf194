// ── Service hosting ──
//
// Runs one long-lived unit of work the way an OS service manager expects:
// report start, run the unit on its own worker thread, wait for a stop
// request, give an HTTP-serving unit a loopback shutdown call, then wait
// a bounded time for the worker before reporting stopped. A worker that
// outlives the join timeout is abandoned so the stop contract holds.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use strum::Display;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::HostError;

/// Internal path an HTTP-serving unit exposes for graceful shutdown.
pub const SHUTDOWN_PATH: &str = "/_internal_shutdown";

/// Default bound on waiting for the worker after a stop request.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(15);

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle states reported to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ServiceStatus {
    StartPending,
    Running,
    StopPending,
    Stopped,
}

/// Receives lifecycle transitions (the OS service manager, in production).
pub trait Supervisor: Send + Sync {
    fn report(&self, service: &str, status: ServiceStatus);
}

/// Supervisor that only records transitions in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSupervisor;

impl Supervisor for LogSupervisor {
    fn report(&self, service: &str, status: ServiceStatus) {
        info!(service, status = %status, "service status");
    }
}

/// A unit of work hosted by [`ServiceHost`].
///
/// `run` is driven on a dedicated thread with its own single-threaded
/// runtime and must return once `stop` is cancelled.
pub trait ServiceUnit: Send + 'static {
    /// Short name for logs and the worker thread.
    fn name(&self) -> &'static str;

    /// Loopback port of an HTTP-serving unit, for the shutdown handshake.
    fn shutdown_port(&self) -> Option<u16> {
        None
    }

    fn run(self, stop: CancellationToken) -> impl Future<Output = ()>;
}

/// How the hosted worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceExit {
    /// `false` when the worker was abandoned after the join timeout.
    pub worker_joined: bool,
    /// `false` when the worker ended on its own, before any stop request.
    pub stop_requested: bool,
}

/// Cloneable handle used to deliver a stop request to a running host.
#[derive(Clone)]
pub struct StopHandle {
    service: &'static str,
    stop: CancellationToken,
    supervisor: Arc<dyn Supervisor>,
}

impl StopHandle {
    /// Report `StopPending`, then wake the host. Repeated calls are ignored.
    pub fn request_stop(&self) {
        if self.stop.is_cancelled() {
            return;
        }
        self.supervisor
            .report(self.service, ServiceStatus::StopPending);
        self.stop.cancel();
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopHandle")
            .field("service", &self.service)
            .field("stop_requested", &self.stop.is_cancelled())
            .finish_non_exhaustive()
    }
}

pub struct ServiceHost<U> {
    unit: U,
    supervisor: Arc<dyn Supervisor>,
    stop: CancellationToken,
    join_timeout: Duration,
}

impl<U: ServiceUnit> ServiceHost<U> {
    pub fn new(unit: U, supervisor: Arc<dyn Supervisor>) -> Self {
        Self {
            unit,
            supervisor,
            stop: CancellationToken::new(),
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            service: self.unit.name(),
            stop: self.stop.clone(),
            supervisor: Arc::clone(&self.supervisor),
        }
    }

    /// Host the unit until a stop request arrives (or the worker ends by
    /// itself) and the worker is joined or abandoned.
    pub async fn run(self) -> Result<ServiceExit, HostError> {
        let Self {
            unit,
            supervisor,
            stop,
            join_timeout,
        } = self;
        let name = unit.name();
        let shutdown_port = unit.shutdown_port();

        supervisor.report(name, ServiceStatus::StartPending);

        let (done_tx, mut done_rx) = oneshot::channel::<()>();
        let worker_stop = stop.clone();
        let worker = std::thread::Builder::new()
            .name(format!("guestpass-{name}"))
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(unit.run(worker_stop)),
                    Err(e) => error!(service = name, error = %e, "failed to build worker runtime"),
                }
                let _ = done_tx.send(());
            })
            .map_err(|source| HostError::Spawn { name, source })?;

        supervisor.report(name, ServiceStatus::Running);

        let worker_finished = tokio::select! {
            biased;
            () = stop.cancelled() => false,
            _ = &mut done_rx => true,
        };

        let worker_joined = if worker_finished {
            warn!(service = name, "worker exited before a stop was requested");
            stop.cancel();
            true
        } else {
            if let Some(port) = shutdown_port {
                request_shutdown(name, port).await;
            }
            match tokio::time::timeout(join_timeout, done_rx).await {
                // A dropped sender means the worker thread panicked; it is gone either way.
                Ok(_) => true,
                Err(_) => {
                    warn!(
                        service = name,
                        timeout_ms = u64::try_from(join_timeout.as_millis()).unwrap_or(u64::MAX),
                        "worker still running after join timeout, abandoning it"
                    );
                    false
                }
            }
        };

        if worker_joined && worker.join().is_err() {
            warn!(service = name, "worker thread panicked");
        }

        supervisor.report(name, ServiceStatus::Stopped);
        Ok(ServiceExit {
            worker_joined,
            stop_requested: !worker_finished,
        })
    }
}

impl<U> fmt::Debug for ServiceHost<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHost")
            .field("join_timeout", &self.join_timeout)
            .field("stop_requested", &self.stop.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// POST to the unit's loopback shutdown path. Failure is logged only.
async fn request_shutdown(service: &str, port: u16) {
    let url = format!("http://127.0.0.1:{port}{SHUTDOWN_PATH}");
    let client = match reqwest::Client::builder()
        .timeout(HANDSHAKE_TIMEOUT)
        .no_proxy()
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(service, error = %e, "cannot build shutdown handshake client");
            return;
        }
    };

    match client.post(&url).send().await {
        Ok(resp) => debug!(service, status = resp.status().as_u16(), "shutdown handshake sent"),
        Err(e) => warn!(service, url = %url, error = %e, "shutdown handshake failed"),
    }
}
