//! PostgreSQL Certificate Store
//!
//! Records are keyed by certificate id; the PEM itself is not stored.

use chrono::Utc;
use sqlx::PgPool;

use crate::domain::repository::CertificateStore;
use crate::domain::value_object::certificate::{
    CertificateId, CertificateStatus, ClientDeviceCertificate,
};
use crate::domain::value_object::thing::Thing;
use crate::error::CdaResult;

/// PostgreSQL-backed device registry
#[derive(Clone)]
pub struct PgCertificateStore {
    pool: PgPool,
}

impl PgCertificateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CertificateStore for PgCertificateStore {
    async fn register(
        &self,
        certificate: &ClientDeviceCertificate,
        thing: Option<Thing>,
    ) -> CdaResult<CertificateId> {
        let certificate_id = certificate.certificate_id()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO client_device_certificates (
                certificate_id,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $3)
            ON CONFLICT (certificate_id)
            DO UPDATE SET status = EXCLUDED.status, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(certificate_id.as_str())
        .bind(CertificateStatus::Active.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Some(thing) = &thing {
            sqlx::query(
                r#"
                INSERT INTO client_device_thing_certificates (
                    thing_name,
                    certificate_id,
                    attached_at
                ) VALUES ($1, $2, $3)
                ON CONFLICT (thing_name, certificate_id) DO NOTHING
                "#,
            )
            .bind(thing.name())
            .bind(certificate_id.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

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

        let found: Option<String> = sqlx::query_scalar(
            r#"
            SELECT certificate_id
            FROM client_device_certificates
            WHERE certificate_id = $1 AND status = $2
            "#,
        )
        .bind(certificate_id.as_str())
        .bind(CertificateStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.map(CertificateId::from_stored))
    }
}
