//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::ClientDeviceCredential;

// ============================================================================
// Verify Client Device Identity
// ============================================================================

/// Verify client device identity request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyClientDeviceIdentityRequest {
    pub credential: Option<ClientDeviceCredentialDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDeviceCredentialDto {
    /// PEM-encoded certificate
    pub client_device_certificate: Option<String>,
}

impl From<ClientDeviceCredentialDto> for ClientDeviceCredential {
    fn from(dto: ClientDeviceCredentialDto) -> Self {
        ClientDeviceCredential {
            client_device_certificate: dto.client_device_certificate,
        }
    }
}

/// Verify client device identity response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyClientDeviceIdentityResponse {
    pub is_valid_client_device: bool,
}
