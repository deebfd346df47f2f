//! Permission Value Object

use serde::{Deserialize, Serialize};
use std::fmt;

/// A request to perform `operation` on `resource`, made by `principal`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub principal: String,
    pub operation: String,
    pub resource: String,
}

impl Permission {
    pub fn new(
        principal: impl Into<String>,
        operation: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.into(),
            operation: operation.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "principal: {}, operation: {}, resource: {}",
            self.principal, self.operation, self.resource
        )
    }
}
