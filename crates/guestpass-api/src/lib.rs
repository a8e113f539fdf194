// guestpass-api: Async Rust client for the controller's guest-identity API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{Session, TenantId};
pub use client::{ControllerClient, GUEST_LIST_LIMIT};
pub use error::Error;
pub use models::{GuestAccount, UpdateAck};
pub use transport::{TlsMode, TransportConfig};
