// guestpass-core: Guest password rotation pipeline and service hosting.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod schedule;
pub mod secret;
pub mod service;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Credentials, RotationConfig, TlsVerification};
pub use error::{HostError, RotationError};
pub use pipeline::{RotationPipeline, RotationStage};
pub use provider::{ConfigProvider, SecretProvider};
pub use schedule::{RotationScheduler, Schedule};
pub use secret::{SecretRandomizer, WordList};
pub use service::{
    LogSupervisor, SHUTDOWN_PATH, ServiceExit, ServiceHost, ServiceStatus, ServiceUnit,
    StopHandle, Supervisor,
};
pub use state::{RotationResult, StateDocument, StateWriter};
