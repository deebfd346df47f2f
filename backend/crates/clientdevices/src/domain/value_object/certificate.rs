//! Client Device Certificate Value Objects
//!
//! The certificate is only ever held for the duration of one request.
//! Stores key their records by [`CertificateId`], never by the PEM text.

use platform::pem::{PemError, certificate_fingerprint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// PEM-encoded certificate presented by a client device
#[derive(Clone, PartialEq, Eq)]
pub struct ClientDeviceCertificate(String);

impl ClientDeviceCertificate {
    /// `None` for an empty string
    pub fn new(pem: impl Into<String>) -> Option<Self> {
        let pem = pem.into();
        if pem.is_empty() { None } else { Some(Self(pem)) }
    }

    #[inline]
    pub fn as_pem(&self) -> &str {
        &self.0
    }

    /// Id of this certificate in the device registry
    pub fn certificate_id(&self) -> Result<CertificateId, PemError> {
        certificate_fingerprint(&self.0).map(CertificateId)
    }
}

// Certificates are never written to logs in full
impl fmt::Debug for ClientDeviceCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientDeviceCertificate")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

/// Lowercase hex SHA-256 of the certificate DER
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(String);

impl CertificateId {
    /// Wrap an id read back from storage
    pub fn from_stored(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration status of a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    Active,
    Inactive,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Active => "ACTIVE",
            CertificateStatus::Inactive => "INACTIVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(CertificateStatus::Active),
            "INACTIVE" => Some(CertificateStatus::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
