//! Component Authentication Middleware
//!
//! Establishes the identity label of the calling component from its bearer
//! token. Handlers behind this middleware can rely on
//! [`AuthenticationData`] being present in the request extensions.

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use platform::client::{extract_bearer_token, extract_client_ip};
use platform::crypto::constant_time_eq;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::application::verify_identity::UNAUTHORIZED_ERROR;
use crate::error::{CdaError, CdaResult, IpcError};

/// Identity of the calling component, set by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationData {
    pub identity_label: String,
}

/// IPC tokens issued to components
#[derive(Clone, Default)]
pub struct ComponentTokens {
    entries: Vec<(String, String)>,
}

impl ComponentTokens {
    pub fn new<I, C, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, T)>,
        C: Into<String>,
        T: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(component, token)| (component.into(), token.into()))
                .collect(),
        }
    }

    /// Parse `component=token,component=token`
    pub fn parse(value: &str) -> CdaResult<Self> {
        let mut entries = Vec::new();

        for (index, entry) in value
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .enumerate()
        {
            let (component, token) = entry
                .split_once('=')
                .map(|(c, t)| (c.trim(), t.trim()))
                .filter(|(c, t)| !c.is_empty() && !t.is_empty())
                .ok_or_else(|| {
                    CdaError::InvalidConfiguration(format!(
                        "component token entry {} must be component=token",
                        index + 1
                    ))
                })?;
            entries.push((component.to_string(), token.to_string()));
        }

        Ok(Self { entries })
    }

    /// Component owning `token`
    ///
    /// Every entry is compared so the time taken does not depend on which
    /// entry matched.
    pub fn identify(&self, token: &str) -> Option<&str> {
        let mut found = None;
        for (component, expected) in &self.entries {
            if constant_time_eq(expected.as_bytes(), token.as_bytes()) && found.is_none() {
                found = Some(component.as_str());
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Tokens are secrets
impl fmt::Debug for ComponentTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(component, _)| component))
            .finish()
    }
}

/// Middleware that requires a known component token
pub async fn authenticate_component(
    State(tokens): State<Arc<ComponentTokens>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, IpcError> {
    let identity_label = match extract_bearer_token(req.headers()) {
        Ok(token) => tokens.identify(token).map(str::to_string),
        Err(e) => {
            tracing::debug!(error = %e, "IPC request without usable token");
            None
        }
    };

    let Some(identity_label) = identity_label else {
        let direct_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        let client_ip = extract_client_ip(req.headers(), direct_ip);
        tracing::warn!(client_ip = ?client_ip, "Rejected IPC request from unknown component");
        return Err(IpcError::Unauthorized(UNAUTHORIZED_ERROR.to_string()));
    };

    req.extensions_mut()
        .insert(AuthenticationData { identity_label });

    Ok(next.run(req).await)
}
