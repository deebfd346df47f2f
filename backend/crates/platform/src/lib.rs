//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, Base64, constant-time compare)
//! - PEM certificate framing and fingerprints
//! - Hierarchical configuration tree with change notification
//! - Caller identification from HTTP headers

pub mod client;
pub mod config;
pub mod crypto;
pub mod pem;
