//! Cross-layer tests for the client devices crate
//! Router -> middleware -> registry -> use case -> store

#[cfg(test)]
mod ipc_tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use kernel::di::UseCaseRegistry;
    use platform::config::Topics;
    use platform::pem::encode_certificate;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::application::config::CLIENT_DEVICES_AUTH_SERVICE_NAME;
    use crate::application::reload::apply_configuration;
    use crate::domain::authorization::PolicyAuthorizationHandler;
    use crate::domain::repository::CertificateStore;
    use crate::domain::value_object::certificate::{
        CertificateId, CertificateStatus, ClientDeviceCertificate,
    };
    use crate::domain::value_object::thing::Thing;
    use crate::error::{CdaError, CdaResult, SERVICE_ERROR_MESSAGE};
    use crate::infra::InMemoryCertificateStore;
    use crate::presentation::middleware::ComponentTokens;
    use crate::presentation::router::ipc_router;

    const BROKER_TOKEN: &str = "broker-token";
    const BRIDGE_TOKEN: &str = "bridge-token";

    /// Store whose backend is always unreachable
    struct UnreachableStore;

    impl CertificateStore for UnreachableStore {
        async fn register(
            &self,
            _certificate: &ClientDeviceCertificate,
            _thing: Option<Thing>,
        ) -> CdaResult<CertificateId> {
            Err(CdaError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn get_active_certificate_id(
            &self,
            _certificate: &ClientDeviceCertificate,
        ) -> CdaResult<Option<CertificateId>> {
            Err(CdaError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn config_tree() -> Topics {
        Topics::from_value(json!({
            "services": {
                CLIENT_DEVICES_AUTH_SERVICE_NAME: {"configuration": {}},
                "broker": {"configuration": {"accessControl": {
                    CLIENT_DEVICES_AUTH_SERVICE_NAME: {
                        "broker:verify": {
                            "operations": ["aws.greengrass#VerifyClientDeviceIdentity"],
                            "resources": ["*"]
                        }
                    }
                }}},
                "bridge": {"configuration": {}}
            }
        }))
    }

    fn tokens() -> ComponentTokens {
        ComponentTokens::new([("broker", BROKER_TOKEN), ("bridge", BRIDGE_TOKEN)])
    }

    fn registered_pem() -> String {
        encode_certificate(b"registered device")
    }

    struct Harness {
        topics: Topics,
        registry: Arc<UseCaseRegistry>,
        store: Arc<InMemoryCertificateStore>,
        app: Router,
    }

    async fn harness() -> Harness {
        let topics = config_tree();
        let registry = Arc::new(UseCaseRegistry::default());
        apply_configuration(&topics, registry.container()).unwrap();

        let store = Arc::new(InMemoryCertificateStore::new());
        store
            .register(
                &ClientDeviceCertificate::new(registered_pem()).unwrap(),
                Some(Thing::new("sensor-1").unwrap()),
            )
            .await
            .unwrap();
        registry.provide(Arc::clone(&store));

        let app = ipc_router::<PolicyAuthorizationHandler, InMemoryCertificateStore>(
            Arc::clone(&registry),
            tokens(),
        );

        Harness {
            topics,
            registry,
            store,
            app,
        }
    }

    async fn call(app: &Router, token: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/verify-client-device-identity")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = request.body(Body::from(body.to_string())).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn certificate_body(pem: &str) -> String {
        json!({"credential": {"clientDeviceCertificate": pem}}).to_string()
    }

    // ========================================================================
    // Success
    // ========================================================================

    #[tokio::test]
    async fn test_registered_certificate_is_valid() {
        let h = harness().await;
        let (status, body) = call(&h.app, Some(BROKER_TOKEN), &certificate_body(&registered_pem())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"isValidClientDevice": true}));
    }

    #[tokio::test]
    async fn test_unregistered_certificate_is_not_valid() {
        let h = harness().await;
        let pem = encode_certificate(b"someone else");
        let (status, body) = call(&h.app, Some(BROKER_TOKEN), &certificate_body(&pem)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"isValidClientDevice": false}));
    }

    #[tokio::test]
    async fn test_undecodable_certificate_is_not_valid() {
        let h = harness().await;
        let (status, body) = call(&h.app, Some(BROKER_TOKEN), &certificate_body("hello")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"isValidClientDevice": false}));
    }

    #[tokio::test]
    async fn test_deactivated_certificate_is_not_valid() {
        let h = harness().await;
        let certificate = ClientDeviceCertificate::new(registered_pem()).unwrap();
        let id = certificate.certificate_id().unwrap();
        assert!(h.store.set_status(&id, CertificateStatus::Inactive).await);

        let (status, body) = call(&h.app, Some(BROKER_TOKEN), &certificate_body(&registered_pem())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"isValidClientDevice": false}));
    }

    // ========================================================================
    // Unauthorized
    // ========================================================================

    #[tokio::test]
    async fn test_missing_token() {
        let h = harness().await;
        let (status, body) = call(&h.app, None, &certificate_body(&registered_pem())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Not Authorized");
        assert_eq!(body["status"], 401);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let h = harness().await;
        let (status, _) = call(&h.app, Some("forged"), &certificate_body(&registered_pem())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unauthorized_component_regardless_of_payload() {
        let h = harness().await;
        for payload in [
            certificate_body(&registered_pem()),
            "{}".to_string(),
            json!({"credential": {}}).to_string(),
            "not json at all".to_string(),
        ] {
            let (status, body) = call(&h.app, Some(BRIDGE_TOKEN), &payload).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "payload: {}", payload);
            assert_eq!(
                body["detail"],
                "Principal bridge is not authorized to perform \
                 aws.greengrass.clientdevices.Auth:aws.greengrass#VerifyClientDeviceIdentity \
                 on resource *"
            );
        }
    }

    // ========================================================================
    // Invalid arguments
    // ========================================================================

    #[tokio::test]
    async fn test_missing_credential() {
        let h = harness().await;
        let (status, body) = call(&h.app, Some(BROKER_TOKEN), "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Client device credential is required");
    }

    #[tokio::test]
    async fn test_missing_certificate() {
        let h = harness().await;
        for payload in [
            json!({"credential": {}}).to_string(),
            json!({"credential": {"clientDeviceCertificate": ""}}).to_string(),
            json!({"credential": {"clientDeviceCertificate": null}}).to_string(),
        ] {
            let (status, body) = call(&h.app, Some(BROKER_TOKEN), &payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
            assert_eq!(body["detail"], "Client device certificate is required");
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let h = harness().await;
        let (status, body) = call(&h.app, Some(BROKER_TOKEN), "not json at all").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["title"], "Bad Request");
    }

    // ========================================================================
    // Service errors
    // ========================================================================

    #[tokio::test]
    async fn test_store_failure_is_opaque() {
        let topics = config_tree();
        let registry = Arc::new(UseCaseRegistry::default());
        apply_configuration(&topics, registry.container()).unwrap();
        registry.provide(Arc::new(UnreachableStore));
        let app = ipc_router::<PolicyAuthorizationHandler, UnreachableStore>(registry, tokens());

        let (status, body) = call(&app, Some(BROKER_TOKEN), &certificate_body(&registered_pem())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], SERVICE_ERROR_MESSAGE);
        assert!(!body.to_string().contains("pool timed out"));
    }

    #[tokio::test]
    async fn test_unwired_store_is_opaque() {
        let topics = config_tree();
        let registry = Arc::new(UseCaseRegistry::default());
        apply_configuration(&topics, registry.container()).unwrap();
        let app = ipc_router::<PolicyAuthorizationHandler, InMemoryCertificateStore>(registry, tokens());

        let (status, body) = call(&app, Some(BROKER_TOKEN), &certificate_body(&registered_pem())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], SERVICE_ERROR_MESSAGE);
        assert!(!body.to_string().contains("InMemoryCertificateStore"));
    }

    // ========================================================================
    // Rebinding
    // ========================================================================

    #[tokio::test]
    async fn test_policy_change_takes_effect_on_next_request() {
        let h = harness().await;
        let valid = certificate_body(&registered_pem());

        let (status, _) = call(&h.app, Some(BRIDGE_TOKEN), &valid).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Grant bridge, revoke broker
        let services = h.topics.child("services");
        services.child("bridge").update(
            &["configuration", "accessControl", CLIENT_DEVICES_AUTH_SERVICE_NAME, "bridge:all"],
            json!({"operations": ["*"], "resources": ["*"]}),
        );
        services
            .child("broker")
            .replace(json!({"configuration": {}}));
        apply_configuration(&h.topics, h.registry.container()).unwrap();

        let (status, body) = call(&h.app, Some(BRIDGE_TOKEN), &valid).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"isValidClientDevice": true}));

        let (status, _) = call(&h.app, Some(BROKER_TOKEN), &valid).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_store_replacement_takes_effect_on_next_request() {
        let h = harness().await;
        let valid = certificate_body(&registered_pem());

        let (_, body) = call(&h.app, Some(BROKER_TOKEN), &valid).await;
        assert_eq!(body["isValidClientDevice"], true);

        h.registry.provide(Arc::new(InMemoryCertificateStore::new()));

        let (status, body) = call(&h.app, Some(BROKER_TOKEN), &valid).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isValidClientDevice"], false);
    }
}
