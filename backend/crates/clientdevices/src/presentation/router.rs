//! IPC Router

use axum::{Router, middleware, routing::post};
use kernel::di::UseCaseRegistry;
use std::sync::Arc;

use crate::domain::authorization::AuthorizationHandler;
use crate::domain::repository::CertificateStore;
use crate::presentation::handlers::{self, IpcAppState};
use crate::presentation::middleware::{ComponentTokens, authenticate_component};

/// Create the IPC router
///
/// Every route requires a component token. Use cases are taken from
/// `registry` on each request, so `A` and `S` must be provided to its
/// container before the first request.
pub fn ipc_router<A, S>(registry: Arc<UseCaseRegistry>, tokens: ComponentTokens) -> Router
where
    A: AuthorizationHandler + 'static,
    S: CertificateStore + Send + Sync + 'static,
{
    let state = IpcAppState::<A, S>::new(registry);

    Router::new()
        .route(
            "/verify-client-device-identity",
            post(handlers::verify_client_device_identity::<A, S>),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::new(tokens),
            authenticate_component,
        ))
        .with_state(state)
}
