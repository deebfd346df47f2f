//! Infrastructure Layer - Certificate store implementations and seeding

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::InMemoryCertificateStore;
pub use postgres::PgCertificateStore;
pub use seed::load_certificates_dir;
