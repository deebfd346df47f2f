//! Client Devices Error Types
//!
//! `CdaError` covers failures inside the domain. `IpcError` is what crosses
//! the IPC boundary: its message is safe to return to the caller and maps to
//! the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::di::DiError;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::pem::PemError;
use thiserror::Error;

use crate::application::VerifyIdentityError;

/// Client-devices result type alias
pub type CdaResult<T> = Result<T, CdaError>;

#[derive(Debug, Error)]
pub enum CdaError {
    /// Configuration tree holds values that cannot be applied
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Certificate could not be decoded
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(#[from] PemError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error classes of the IPC wire contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpcError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidArguments(String),

    /// Message is generic; causes are only logged
    #[error("{0}")]
    ServiceError(String),
}

/// Returned when the service cannot serve a request for reasons internal to it
pub const SERVICE_ERROR_MESSAGE: &str =
    "Verifying client device identity failed. Check the service log for details.";

impl IpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IpcError::Unauthorized(_) => ErrorKind::Unauthorized,
            IpcError::InvalidArguments(_) => ErrorKind::BadRequest,
            IpcError::ServiceError(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    fn log(&self) {
        match self {
            IpcError::ServiceError(msg) => {
                tracing::error!(message = %msg, "IPC request failed");
            }
            IpcError::Unauthorized(msg) => {
                tracing::warn!(message = %msg, "IPC request rejected");
            }
            IpcError::InvalidArguments(msg) => {
                tracing::debug!(message = %msg, "IPC request invalid");
            }
        }
    }
}

impl IntoResponse for IpcError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<VerifyIdentityError> for IpcError {
    fn from(err: VerifyIdentityError) -> Self {
        match err {
            VerifyIdentityError::Unauthorized(reason) => IpcError::Unauthorized(reason),
            VerifyIdentityError::InvalidArgument(reason) => IpcError::InvalidArguments(reason),
            VerifyIdentityError::ServiceError => {
                IpcError::ServiceError(SERVICE_ERROR_MESSAGE.to_string())
            }
        }
    }
}

/// Wiring failures never reach the caller in detail.
impl From<DiError> for IpcError {
    fn from(err: DiError) -> Self {
        let app_error = AppError::from(err);
        tracing::error!(error = ?app_error, "Use case is not available");
        IpcError::ServiceError(SERVICE_ERROR_MESSAGE.to_string())
    }
}
