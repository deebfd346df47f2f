//! Application Configuration
//!
//! Snapshots derived from the configuration tree. A snapshot is immutable;
//! a configuration change produces a new one which is then provided to the
//! dependency container.
//!
//! ## Layout
//! ```text
//! services
//! ├── aws.greengrass.clientdevices.Auth
//! │   └── configuration
//! │       └── certificateAuthority
//! │           ├── certificateUri
//! │           ├── privateKeyUri
//! │           └── caType
//! └── <component>
//!     └── configuration
//!         └── accessControl
//!             └── <namespace>
//!                 └── <policyId>
//!                     ├── operations: [..]
//!                     └── resources:  [..]
//! ```

use platform::config::Topics;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::domain::authorization::AuthorizationPolicy;
use crate::error::{CdaError, CdaResult};

pub const CLIENT_DEVICES_AUTH_SERVICE_NAME: &str = "aws.greengrass.clientdevices.Auth";

pub const SERVICES_TOPIC: &str = "services";
pub const CONFIGURATION_CONFIG_KEY: &str = "configuration";
pub const CERTIFICATE_AUTHORITY_TOPIC: &str = "certificateAuthority";
pub const CA_CERTIFICATE_URI: &str = "certificateUri";
pub const CA_PRIVATE_KEY_URI: &str = "privateKeyUri";
pub const CA_TYPE_KEY: &str = "caType";
pub const ACCESS_CONTROL_NAMESPACE_TOPIC: &str = "accessControl";

/// Key algorithm of the certificate authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CaType {
    #[default]
    #[serde(rename = "RSA_2048")]
    Rsa2048,
    #[serde(rename = "ECDSA_P256")]
    EcdsaP256,
}

impl CaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaType::Rsa2048 => "RSA_2048",
            CaType::EcdsaP256 => "ECDSA_P256",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RSA_2048" => Some(CaType::Rsa2048),
            "ECDSA_P256" => Some(CaType::EcdsaP256),
            _ => None,
        }
    }
}

impl fmt::Display for CaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Certificate authority settings
///
/// Without URIs the service manages its own CA.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaConfiguration {
    pub certificate_uri: Option<String>,
    pub private_key_uri: Option<String>,
    pub ca_type: CaType,
}

impl CaConfiguration {
    /// Whether a custom CA is configured
    pub fn is_custom(&self) -> bool {
        self.certificate_uri.is_some()
    }
}

/// Client devices auth configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CdaConfiguration {
    certificate_authority: CaConfiguration,
}

impl CdaConfiguration {
    /// Derive a snapshot from the service's topics
    ///
    /// `service` is the node of the service itself, i.e.
    /// `services.aws.greengrass.clientdevices.Auth`.
    pub fn from_topics(service: &Topics) -> CdaResult<Self> {
        let ca = service
            .child(CONFIGURATION_CONFIG_KEY)
            .child(CERTIFICATE_AUTHORITY_TOPIC);

        let certificate_uri = ca
            .lookup_str(&[CA_CERTIFICATE_URI])
            .map(|uri| validate_uri(CA_CERTIFICATE_URI, uri))
            .transpose()?;
        let private_key_uri = ca
            .lookup_str(&[CA_PRIVATE_KEY_URI])
            .map(|uri| validate_uri(CA_PRIVATE_KEY_URI, uri))
            .transpose()?;

        if certificate_uri.is_some() != private_key_uri.is_some() {
            return Err(CdaError::InvalidConfiguration(format!(
                "{} and {} must be configured together",
                CA_CERTIFICATE_URI, CA_PRIVATE_KEY_URI
            )));
        }

        let ca_type = parse_ca_type(ca.lookup(&[CA_TYPE_KEY]))?;

        Ok(Self {
            certificate_authority: CaConfiguration {
                certificate_uri,
                private_key_uri,
                ca_type,
            },
        })
    }

    pub fn certificate_authority(&self) -> &CaConfiguration {
        &self.certificate_authority
    }

    pub fn certificate_uri(&self) -> Option<&str> {
        self.certificate_authority.certificate_uri.as_deref()
    }

    pub fn private_key_uri(&self) -> Option<&str> {
        self.certificate_authority.private_key_uri.as_deref()
    }

    pub fn ca_type(&self) -> CaType {
        self.certificate_authority.ca_type
    }
}

/// URI must start with `scheme:` (RFC 3986)
fn validate_uri(key: &str, uri: String) -> CdaResult<String> {
    let has_scheme = uri.split_once(':').is_some_and(|(scheme, rest)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            && !rest.is_empty()
    });

    if has_scheme {
        Ok(uri)
    } else {
        Err(CdaError::InvalidConfiguration(format!(
            "{} is not a valid URI: {}",
            key, uri
        )))
    }
}

/// `caType` may be a string or a list whose first entry is used
fn parse_ca_type(value: Option<Value>) -> CdaResult<CaType> {
    let name = match value {
        None | Some(Value::Null) => return Ok(CaType::default()),
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) => match items.into_iter().next() {
            None => return Ok(CaType::default()),
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(CdaError::InvalidConfiguration(format!(
                    "{} must be a string, got {}",
                    CA_TYPE_KEY, other
                )));
            }
        },
        Some(other) => {
            return Err(CdaError::InvalidConfiguration(format!(
                "{} must be a string, got {}",
                CA_TYPE_KEY, other
            )));
        }
    };

    CaType::parse(&name).ok_or_else(|| {
        CdaError::InvalidConfiguration(format!("Unsupported {}: {}", CA_TYPE_KEY, name))
    })
}

/// Collect the access-control policies of every service
///
/// `services` is the `services` node. The principal of each policy is the
/// service that declares it.
pub fn access_control_policies(services: &Topics) -> CdaResult<Vec<AuthorizationPolicy>> {
    let mut policies = Vec::new();

    for component in services.children() {
        let Some(access_control) = services.child(&component).lookup(&[
            CONFIGURATION_CONFIG_KEY,
            ACCESS_CONTROL_NAMESPACE_TOPIC,
        ]) else {
            continue;
        };

        let Value::Object(namespaces) = access_control else {
            return Err(invalid_access_control(&component, "must be an object"));
        };

        for (namespace, entries) in namespaces {
            let Value::Object(entries) = entries else {
                return Err(invalid_access_control(
                    &component,
                    &format!("namespace {} must be an object", namespace),
                ));
            };

            for (policy_id, policy) in entries {
                policies.push(AuthorizationPolicy {
                    operations: string_list(&component, &policy_id, &policy, "operations")?,
                    resources: string_list(&component, &policy_id, &policy, "resources")?,
                    policy_id,
                    principal: component.clone(),
                    namespace: namespace.clone(),
                });
            }
        }
    }

    Ok(policies)
}

fn string_list(component: &str, policy_id: &str, policy: &Value, key: &str) -> CdaResult<Vec<String>> {
    let items = policy.get(key).and_then(Value::as_array).ok_or_else(|| {
        invalid_access_control(component, &format!("policy {} must list {}", policy_id, key))
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                invalid_access_control(
                    component,
                    &format!("policy {} has a non-string entry in {}", policy_id, key),
                )
            })
        })
        .collect()
}

fn invalid_access_control(component: &str, detail: &str) -> CdaError {
    CdaError::InvalidConfiguration(format!(
        "{}.{}.{}: {}",
        component, CONFIGURATION_CONFIG_KEY, ACCESS_CONTROL_NAMESPACE_TOPIC, detail
    ))
}
