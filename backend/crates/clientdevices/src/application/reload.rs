//! Configuration Reload
//!
//! Derives fresh configuration-dependent instances from the configuration
//! tree and provides them to the container. Use cases built on the previous
//! instances are rebuilt on their next lookup.

use kernel::di::DependencyContainer;
use platform::config::Topics;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::application::config::{
    CLIENT_DEVICES_AUTH_SERVICE_NAME, CdaConfiguration, SERVICES_TOPIC, access_control_policies,
};
use crate::domain::authorization::PolicyAuthorizationHandler;
use crate::error::CdaResult;

/// Provide a new `CdaConfiguration` and `PolicyAuthorizationHandler`
///
/// `topics` is the root of the configuration tree. Both instances are
/// derived before either is provided, so an invalid tree leaves the
/// container untouched, and they are provided together, so no lookup sees
/// one without the other.
pub fn apply_configuration(topics: &Topics, container: &DependencyContainer) -> CdaResult<()> {
    let services = topics.child(SERVICES_TOPIC);
    let configuration =
        CdaConfiguration::from_topics(&services.child(CLIENT_DEVICES_AUTH_SERVICE_NAME))?;
    let policies = access_control_policies(&services)?;
    let authorizer = PolicyAuthorizationHandler::new(policies);

    tracing::info!(
        custom_ca = configuration.certificate_authority().is_custom(),
        ca_type = %configuration.ca_type(),
        policies = authorizer.policy_count(),
        "Applying client devices auth configuration"
    );

    container.provide_all((Arc::new(configuration), Arc::new(authorizer)));
    Ok(())
}

/// Re-apply the configuration on every change of `topics`
///
/// Failures are logged and the previously provided instances stay in place.
pub fn spawn_configuration_reloader(
    topics: Topics,
    container: Arc<DependencyContainer>,
) -> JoinHandle<()> {
    let mut changes = topics.subscribe();

    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let version = *changes.borrow_and_update();
            match apply_configuration(&topics, &container) {
                Ok(()) => tracing::info!(version, "Configuration reloaded"),
                Err(e) => tracing::error!(
                    version,
                    error = %e,
                    "Configuration reload failed, keeping previous configuration"
                ),
            }
        }
    })
}
