//! Repository Traits
//!
//! Interfaces for the device registry. Implementations are in the infra layer.

use crate::domain::value_object::certificate::{CertificateId, ClientDeviceCertificate};
use crate::domain::value_object::thing::Thing;
use crate::error::CdaResult;

/// Authoritative source of client device certificates
#[trait_variant::make(CertificateStore: Send)]
pub trait LocalCertificateStore {
    /// Register `certificate` as active, optionally attached to `thing`
    ///
    /// Registering a known certificate reactivates it. Fails with
    /// `CdaError::InvalidCertificate` when the PEM cannot be decoded.
    async fn register(
        &self,
        certificate: &ClientDeviceCertificate,
        thing: Option<Thing>,
    ) -> CdaResult<CertificateId>;

    /// Id of `certificate` if it is registered and currently active
    ///
    /// A certificate that cannot be decoded is not a registered one:
    /// implementations return `Ok(None)` for it. `Err` is reserved for
    /// failures of the backing store.
    async fn get_active_certificate_id(
        &self,
        certificate: &ClientDeviceCertificate,
    ) -> CdaResult<Option<CertificateId>>;
}
