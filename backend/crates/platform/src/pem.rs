//! PEM certificate decoding
//!
//! The first `CERTIFICATE` section is decoded to DER with `rustls-pki-types`.
//! The DER itself is treated as opaque bytes.

use rustls_pki_types::CertificateDer;
use rustls_pki_types::pem::{self, PemObject};
use thiserror::Error;

use crate::crypto::{sha256_hex, to_base64};

const BEGIN_CERTIFICATE: &str = "-----BEGIN CERTIFICATE-----";
const END_CERTIFICATE: &str = "-----END CERTIFICATE-----";

/// PEM decoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PemError {
    #[error("No CERTIFICATE section found")]
    MissingBlock,

    #[error("CERTIFICATE section is empty")]
    Empty,

    #[error("Malformed CERTIFICATE section: {0}")]
    Malformed(String),
}

impl From<pem::Error> for PemError {
    fn from(err: pem::Error) -> Self {
        match err {
            pem::Error::NoItemsFound => PemError::MissingBlock,
            other => PemError::Malformed(other.to_string()),
        }
    }
}

/// Decode the first `CERTIFICATE` section of `pem` to DER bytes
///
/// Text outside the section and sections of other kinds are skipped.
pub fn decode_certificate(pem: &str) -> Result<Vec<u8>, PemError> {
    let der = CertificateDer::from_pem_slice(pem.as_bytes())?;
    if der.is_empty() {
        return Err(PemError::Empty);
    }
    Ok(der.to_vec())
}

/// Certificate fingerprint: lowercase hex SHA-256 of the DER encoding
///
/// Formatting differences in the PEM (line length, CRLF, surrounding text)
/// do not change the fingerprint.
pub fn certificate_fingerprint(pem: &str) -> Result<String, PemError> {
    decode_certificate(pem).map(|der| sha256_hex(&der))
}

/// Wrap DER bytes in a `CERTIFICATE` section with 64-column lines
pub fn encode_certificate(der: &[u8]) -> String {
    let encoded = to_base64(der);
    let mut pem = String::with_capacity(encoded.len() + 64);
    pem.push_str(BEGIN_CERTIFICATE);
    pem.push('\n');
    for chunk in encoded.as_bytes().chunks(64) {
        // base64 output is ASCII
        pem.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        pem.push('\n');
    }
    pem.push_str(END_CERTIFICATE);
    pem.push('\n');
    pem
}
