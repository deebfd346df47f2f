//! Client Devices Auth Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Things, certificates, authorization, store traits
//! - `application/` - Use cases, configuration snapshots, reload
//! - `infra/` - In-memory and PostgreSQL certificate stores, directory seeding
//! - `presentation/` - IPC handlers, DTOs, router, component authentication
//!
//! ## Security Model
//! - Callers are components identified by IPC token; the identity label
//!   comes from the transport, never from the request body
//! - Authorization is checked before the payload is looked at
//! - Internal failures are logged with their cause and reported to the
//!   caller with a fixed message

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{CLIENT_DEVICES_AUTH_SERVICE_NAME, CdaConfiguration};
pub use application::reload::{apply_configuration, spawn_configuration_reloader};
pub use domain::authorization::PolicyAuthorizationHandler;
pub use error::{CdaError, CdaResult, IpcError};
pub use infra::{InMemoryCertificateStore, PgCertificateStore, load_certificates_dir};
pub use presentation::middleware::ComponentTokens;
pub use presentation::router::ipc_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
