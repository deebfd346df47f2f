//! Error conversions - transport representations of [`AppError`]
//!
//! The response body carries only `kind` and `message`; `source` never
//! leaves the process.

use super::app_error::AppError;
use super::kind::ErrorKind;
use crate::di::DiError;

// ============================================================================
// Kernel conversions
// ============================================================================

/// Wiring failures are internal: the caller only learns that the service failed.
impl From<DiError> for AppError {
    fn from(err: DiError) -> Self {
        AppError::new(ErrorKind::InternalServerError, "Service is not ready").with_source(err)
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
        });

        (status, Json(body)).into_response()
    }
}
