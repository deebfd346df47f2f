//! Verify Client Device Identity Use Case
//!
//! Authorize the calling component, validate the presented credential,
//! then ask the certificate store whether the certificate is active.
//! The steps run in that order and stop at the first failure.

use kernel::di::Injectable;
use kernel::use_case::UseCase;
use std::sync::Arc;
use thiserror::Error;

use crate::application::config::CLIENT_DEVICES_AUTH_SERVICE_NAME;
use crate::domain::authorization::AuthorizationHandler;
use crate::domain::repository::CertificateStore;
use crate::domain::value_object::certificate::ClientDeviceCertificate;
use crate::domain::value_object::permission::Permission;
use crate::error::SERVICE_ERROR_MESSAGE;

pub const VERIFY_CLIENT_DEVICE_IDENTITY: &str = "aws.greengrass#VerifyClientDeviceIdentity";
pub const ANY_RESOURCE: &str = "*";

pub const UNAUTHORIZED_ERROR: &str = "Not Authorized";
pub const NO_DEVICE_CREDENTIAL_ERROR: &str = "Client device credential is required";
pub const NO_DEVICE_CERTIFICATE_ERROR: &str = "Client device certificate is required";

/// Credential presented on behalf of a client device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDeviceCredential {
    pub client_device_certificate: Option<String>,
}

/// Credential part of the request, as decoded by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialPayload {
    Missing,
    Present(ClientDeviceCredential),
    /// The request body could not be decoded
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct VerifyClientDeviceIdentityInput {
    /// Identity label of the calling component, established by the transport
    pub caller: String,
    pub credential: CredentialPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyIdentityError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidArgument(String),

    /// Cause is logged, never carried
    #[error("{}", SERVICE_ERROR_MESSAGE)]
    ServiceError,
}

pub struct VerifyClientDeviceIdentityUseCase<A, S> {
    authorizer: Arc<A>,
    store: Arc<S>,
}

impl<A, S> VerifyClientDeviceIdentityUseCase<A, S>
where
    A: AuthorizationHandler,
    S: CertificateStore + Send + Sync,
{
    pub fn new(authorizer: Arc<A>, store: Arc<S>) -> Self {
        Self { authorizer, store }
    }

    fn authorize(&self, caller: &str) -> Result<(), VerifyIdentityError> {
        let permission = Permission::new(caller, VERIFY_CLIENT_DEVICE_IDENTITY, ANY_RESOURCE);

        let reason = match self
            .authorizer
            .is_authorized(CLIENT_DEVICES_AUTH_SERVICE_NAME, &permission)
        {
            Ok(true) => return Ok(()),
            Ok(false) => UNAUTHORIZED_ERROR.to_string(),
            Err(e) => e.to_string(),
        };

        tracing::warn!(error = %reason, component_name = %caller, "{}", UNAUTHORIZED_ERROR);
        Err(VerifyIdentityError::Unauthorized(reason))
    }
}

fn certificate_from(
    credential: CredentialPayload,
) -> Result<ClientDeviceCertificate, VerifyIdentityError> {
    let credential = match credential {
        CredentialPayload::Present(credential) => credential,
        CredentialPayload::Missing => {
            return Err(VerifyIdentityError::InvalidArgument(
                NO_DEVICE_CREDENTIAL_ERROR.to_string(),
            ));
        }
        CredentialPayload::Malformed(detail) => {
            return Err(VerifyIdentityError::InvalidArgument(detail));
        }
    };

    credential
        .client_device_certificate
        .and_then(ClientDeviceCertificate::new)
        .ok_or_else(|| VerifyIdentityError::InvalidArgument(NO_DEVICE_CERTIFICATE_ERROR.to_string()))
}

impl<A, S> Injectable for VerifyClientDeviceIdentityUseCase<A, S>
where
    A: AuthorizationHandler + 'static,
    S: CertificateStore + Send + Sync + 'static,
{
    type Dependencies = (Arc<A>, Arc<S>);

    fn inject((authorizer, store): Self::Dependencies) -> Self {
        Self::new(authorizer, store)
    }
}

impl<A, S> UseCase for VerifyClientDeviceIdentityUseCase<A, S>
where
    A: AuthorizationHandler + 'static,
    S: CertificateStore + Send + Sync + 'static,
{
    type Input = VerifyClientDeviceIdentityInput;
    type Output = bool;
    type Error = VerifyIdentityError;

    async fn apply(&self, input: Self::Input) -> Result<bool, VerifyIdentityError> {
        let VerifyClientDeviceIdentityInput { caller, credential } = input;

        self.authorize(&caller)?;
        let certificate = certificate_from(credential)?;

        match self.store.get_active_certificate_id(&certificate).await {
            Ok(certificate_id) => {
                tracing::debug!(
                    component_name = %caller,
                    is_valid = certificate_id.is_some(),
                    "Verified client device identity"
                );
                Ok(certificate_id.is_some())
            }
            Err(e) => {
                tracing::error!(error = %e, component_name = %caller, "Unable to verify client device identity");
                Err(VerifyIdentityError::ServiceError)
            }
        }
    }
}
