//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" shared by every domain crate:
//! - Common error types and result aliases
//! - The dependency container and the use-case registry built on top of it
//! - The `UseCase` capability every unit of application logic implements
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod di {
    //! Type-keyed dependency container and use-case registry.

    pub mod container;
    pub mod error;
    pub mod registry;

    pub use container::{DependencyContainer, InstanceId, Provider, Resolver};
    pub use error::{DiError, DiResult};
    pub use registry::{Dependencies, Injectable, UseCaseRegistry};
}
pub mod use_case;
