//! Domain Layer
//!
//! Things, certificates, authorization and the store interfaces.

pub mod authorization;
pub mod repository;
pub mod value_object;
