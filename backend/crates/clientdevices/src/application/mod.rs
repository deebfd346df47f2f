//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations and configuration snapshots.

pub mod config;
pub mod describe_ca;
pub mod reload;
pub mod verify_identity;

pub use describe_ca::DescribeCertificateAuthorityUseCase;
pub use verify_identity::{
    ClientDeviceCredential, CredentialPayload, VerifyClientDeviceIdentityInput,
    VerifyClientDeviceIdentityUseCase, VerifyIdentityError,
};
