//! Authorization
//!
//! The yes/no contract used by use cases, and a policy-table
//! implementation of it. Policies grant a principal a set of operations
//! on a set of resources within a namespace. Granted values are matched as
//! [`DeviceAttribute`] expressions: exact, with `*` standing for any run of
//! characters. There is no richer policy language.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::value_object::device_attribute::DeviceAttribute;
use crate::domain::value_object::permission::Permission;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error(
        "Principal {principal} is not authorized to perform {namespace}:{operation} on resource {resource}"
    )]
    NotAuthorized {
        principal: String,
        namespace: String,
        operation: String,
        resource: String,
    },
}

impl AuthorizationError {
    pub fn not_authorized(namespace: &str, permission: &Permission) -> Self {
        AuthorizationError::NotAuthorized {
            principal: permission.principal.clone(),
            namespace: namespace.to_string(),
            operation: permission.operation.clone(),
            resource: permission.resource.clone(),
        }
    }
}

/// Decides whether a principal may perform an operation
///
/// `Ok(false)` and `Err(_)` are both denials; the error carries a reason.
pub trait AuthorizationHandler: Send + Sync {
    fn is_authorized(
        &self,
        namespace: &str,
        permission: &Permission,
    ) -> Result<bool, AuthorizationError>;
}

/// A single grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationPolicy {
    pub policy_id: String,
    pub principal: String,
    pub namespace: String,
    pub operations: Vec<String>,
    pub resources: Vec<String>,
}

impl AuthorizationPolicy {
    fn grants(&self, permission: &Permission) -> bool {
        matches_any(std::slice::from_ref(&self.principal), &permission.principal)
            && matches_any(&self.operations, &permission.operation)
            && matches_any(&self.resources, &permission.resource)
    }
}

fn matches_any(granted: &[String], requested: &str) -> bool {
    let requested = DeviceAttribute::StringLiteral(requested.to_string());
    granted.iter().any(|expression| requested.matches(expression))
}

/// Evaluates permissions against a fixed policy table
#[derive(Debug, Clone, Default)]
pub struct PolicyAuthorizationHandler {
    by_namespace: HashMap<String, Vec<AuthorizationPolicy>>,
}

impl PolicyAuthorizationHandler {
    pub fn new(policies: impl IntoIterator<Item = AuthorizationPolicy>) -> Self {
        let mut by_namespace: HashMap<String, Vec<AuthorizationPolicy>> = HashMap::new();
        for policy in policies {
            by_namespace
                .entry(policy.namespace.clone())
                .or_default()
                .push(policy);
        }
        Self { by_namespace }
    }

    /// Number of policies across all namespaces
    pub fn policy_count(&self) -> usize {
        self.by_namespace.values().map(Vec::len).sum()
    }
}

impl AuthorizationHandler for PolicyAuthorizationHandler {
    fn is_authorized(
        &self,
        namespace: &str,
        permission: &Permission,
    ) -> Result<bool, AuthorizationError> {
        let granted = self
            .by_namespace
            .get(namespace)
            .and_then(|policies| policies.iter().find(|p| p.grants(permission)));

        match granted {
            Some(policy) => {
                tracing::debug!(
                    policy_id = %policy.policy_id,
                    principal = %permission.principal,
                    operation = %permission.operation,
                    "Permission granted"
                );
                Ok(true)
            }
            None => Err(AuthorizationError::not_authorized(namespace, permission)),
        }
    }
}
