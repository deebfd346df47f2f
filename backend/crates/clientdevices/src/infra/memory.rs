//! In-Memory Certificate Store
//!
//! Process-local device registry. Used when no database is configured and
//! in tests.

use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::domain::repository::CertificateStore;
use crate::domain::value_object::certificate::{
    CertificateId, CertificateStatus, ClientDeviceCertificate,
};
use crate::domain::value_object::thing::Thing;
use crate::error::CdaResult;

#[derive(Debug)]
struct CertificateRecord {
    status: CertificateStatus,
    things: BTreeSet<Thing>,
}

#[derive(Debug, Default)]
pub struct InMemoryCertificateStore {
    records: RwLock<HashMap<CertificateId, CertificateRecord>>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the status of a registered certificate; `false` if unknown
    #[cfg(test)]
    pub(crate) async fn set_status(
        &self,
        certificate_id: &CertificateId,
        status: CertificateStatus,
    ) -> bool {
        match self.records.write().await.get_mut(certificate_id) {
            Some(record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    /// Things attached to a certificate, sorted by name
    #[cfg(test)]
    pub(crate) async fn things_for(&self, certificate_id: &CertificateId) -> Vec<Thing> {
        self.records
            .read()
            .await
            .get(certificate_id)
            .map(|record| record.things.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl CertificateStore for InMemoryCertificateStore {
    async fn register(
        &self,
        certificate: &ClientDeviceCertificate,
        thing: Option<Thing>,
    ) -> CdaResult<CertificateId> {
        let certificate_id = certificate.certificate_id()?;

        let mut records = self.records.write().await;
        let record = records
            .entry(certificate_id.clone())
            .or_insert_with(|| CertificateRecord {
                status: CertificateStatus::Active,
                things: BTreeSet::new(),
            });
        record.status = CertificateStatus::Active;
        record.things.extend(thing);

        tracing::debug!(certificate_id = %certificate_id, "Registered client device certificate");
        Ok(certificate_id)
    }

    async fn get_active_certificate_id(
        &self,
        certificate: &ClientDeviceCertificate,
    ) -> CdaResult<Option<CertificateId>> {
        let certificate_id = match certificate.certificate_id() {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(error = %e, "Presented certificate is not decodable");
                return Ok(None);
            }
        };

        let records = self.records.read().await;
        Ok(records
            .get(&certificate_id)
            .filter(|record| record.status == CertificateStatus::Active)
            .map(|_| certificate_id.clone()))
    }
}
