//! Certificate Seeding
//!
//! Registers every `<thingName>.pem` file of a directory with a store.

use std::path::Path;

use crate::domain::repository::CertificateStore;
use crate::domain::value_object::certificate::ClientDeviceCertificate;
use crate::domain::value_object::thing::Thing;
use crate::error::CdaResult;

/// Register every `<thingName>.pem` file in `dir` with `store`
///
/// Files whose stem is not a valid thing name or whose contents are not
/// a certificate are skipped with a warning. Failures of the store itself
/// abort the load. Returns the number of certificates registered.
pub async fn load_certificates_dir<S>(store: &S, dir: impl AsRef<Path>) -> CdaResult<usize>
where
    S: CertificateStore + Sync,
{
    let dir = dir.as_ref();
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut loaded = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pem") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let thing = match Thing::new(stem) {
            Ok(thing) => thing,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping certificate file");
                continue;
            }
        };

        let pem = tokio::fs::read_to_string(&path).await?;
        let Some(certificate) = ClientDeviceCertificate::new(pem) else {
            tracing::warn!(path = %path.display(), "Skipping empty certificate file");
            continue;
        };
        if let Err(e) = certificate.certificate_id() {
            tracing::warn!(path = %path.display(), error = %e, "Skipping certificate file");
            continue;
        }

        store.register(&certificate, Some(thing)).await?;
        loaded += 1;
    }

    tracing::info!(dir = %dir.display(), certificates = loaded, "Loaded client device certificates");
    Ok(loaded)
}
