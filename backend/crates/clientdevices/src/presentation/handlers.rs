//! HTTP Handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use kernel::di::UseCaseRegistry;
use kernel::use_case::UseCase;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::application::{
    CredentialPayload, VerifyClientDeviceIdentityInput, VerifyClientDeviceIdentityUseCase,
};
use crate::domain::authorization::AuthorizationHandler;
use crate::domain::repository::CertificateStore;
use crate::error::IpcError;
use crate::presentation::dto::{VerifyClientDeviceIdentityRequest, VerifyClientDeviceIdentityResponse};
use crate::presentation::middleware::AuthenticationData;

/// Shared state for IPC handlers
///
/// `A` and `S` select which use case instantiation the registry builds.
pub struct IpcAppState<A, S> {
    pub registry: Arc<UseCaseRegistry>,
    _marker: PhantomData<fn() -> (A, S)>,
}

impl<A, S> IpcAppState<A, S> {
    pub fn new(registry: Arc<UseCaseRegistry>) -> Self {
        Self {
            registry,
            _marker: PhantomData,
        }
    }
}

impl<A, S> Clone for IpcAppState<A, S> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.registry))
    }
}

// ============================================================================
// Verify Client Device Identity
// ============================================================================

/// POST /ipc/verify-client-device-identity
///
/// The body is decoded leniently so that an unauthorized caller learns
/// nothing about the validity of its payload.
pub async fn verify_client_device_identity<A, S>(
    State(state): State<IpcAppState<A, S>>,
    Extension(authentication): Extension<AuthenticationData>,
    payload: Result<Json<VerifyClientDeviceIdentityRequest>, JsonRejection>,
) -> Result<Json<VerifyClientDeviceIdentityResponse>, IpcError>
where
    A: AuthorizationHandler + 'static,
    S: CertificateStore + Send + Sync + 'static,
{
    let credential = match payload {
        Ok(Json(request)) => match request.credential {
            Some(credential) => CredentialPayload::Present(credential.into()),
            None => CredentialPayload::Missing,
        },
        Err(rejection) => CredentialPayload::Malformed(rejection.body_text()),
    };

    // Looked up per request so configuration changes take effect
    let use_case = state
        .registry
        .get::<VerifyClientDeviceIdentityUseCase<A, S>>()?;

    let is_valid_client_device = use_case
        .apply(VerifyClientDeviceIdentityInput {
            caller: authentication.identity_label,
            credential,
        })
        .await?;

    Ok(Json(VerifyClientDeviceIdentityResponse {
        is_valid_client_device,
    }))
}
