//! Dependency resolution errors

use thiserror::Error;

/// Result alias for container and registry operations
pub type DiResult<T> = Result<T, DiError>;

/// Wiring failures
///
/// Both variants are programming/configuration errors: a correctly
/// bootstrapped process never produces them. They are surfaced to the
/// caller instead of being defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// Nothing has been provided for the requested type
    #[error("No instance has been provided for {type_name}")]
    MissingDependency { type_name: &'static str },

    /// The stored instance does not downcast to the requested type
    #[error("Registered instance does not match requested type {type_name}")]
    TypeMismatch { type_name: &'static str },
}

impl DiError {
    pub(crate) fn missing<T: ?Sized>() -> Self {
        Self::MissingDependency {
            type_name: std::any::type_name::<T>(),
        }
    }

    pub(crate) fn mismatch<T: ?Sized>() -> Self {
        Self::TypeMismatch {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Name of the type that failed to resolve
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::MissingDependency { type_name } | Self::TypeMismatch { type_name } => type_name,
        }
    }
}
