//! Client identification utilities
//!
//! Common functions for identifying callers via HTTP headers.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Error when extracting caller credentials from headers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Malformed {0} header")]
    Malformed(String),
}

/// Extract the bearer token from the `Authorization` header
///
/// ## Arguments
/// * `headers` - HTTP request headers
///
/// ## Returns
/// * `Ok(&str)` - The token, without the `Bearer ` prefix
/// * `Err(TokenError)` - Header missing, not UTF-8, not a bearer scheme, or empty
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| TokenError::MissingHeader("Authorization".to_string()))?
        .to_str()
        .map_err(|_| TokenError::Malformed("Authorization".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| TokenError::Malformed("Authorization".to_string()))?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(TokenError::Malformed("Authorization".to_string()));
    }

    Ok(token)
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    // Check X-Forwarded-For header (first IP in the list)
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}
