//! # Guest API Service
//!
//! Wires the subsystems behind one axum router:
//!
//! ```text
//! request ─→ BearerAuthLayer ─→ /1.0/instances/{name}        ─→ DeviceOwnershipApi
//!            (Identity ext)     /1.0/operations/{id}/wait    ─→ OperationWaitApi
//!                               /1.0/events                  ─→ EventHub
//! ```
//!
//! Unsupported methods on known routes answer 501, unknown paths 404. Both
//! still require authentication.

use crate::domain::config::{ConfigError, GuestApiConfig};
use crate::handlers::{self, instances, operations};
use crate::middleware::BearerAuthLayer;
use crate::ws::events;
use axum::routing::get;
use axum::Router;
use gc_01_bearer_auth::{BearerAuthApi, BearerAuthenticator, TokenScope};
use gc_02_device_ownership::{
    CustomVolumeValidator, DeviceOwnershipApi, DeviceOwnershipService, InstanceBackend,
};
use gc_03_operation_wait::{OperationWaitApi, OperationWaitBridge, OperationWaiter};
use shared_bus::{EventHub, EventTransport};
use shared_types::IdentityCache;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<dyn BearerAuthApi>,
    pub identities: Arc<dyn IdentityCache>,
    pub devices: Arc<dyn DeviceOwnershipApi>,
    pub operations: Arc<dyn OperationWaitApi>,
    pub hub: EventHub,
    /// Host target every event stream subscribes to
    pub event_target: String,
}

impl AppState {
    /// Build the standard stack from configuration: a guest-scope
    /// authenticator, the custom-volume device validator, a wait bridge
    /// capped at `max_wait` and a hub over `transport`.
    pub fn from_config<B, W>(
        config: &GuestApiConfig,
        identities: Arc<dyn IdentityCache>,
        backend: Arc<B>,
        waiter: Arc<W>,
        transport: Arc<dyn EventTransport>,
    ) -> Result<Self, ConfigError>
    where
        B: InstanceBackend + 'static,
        W: OperationWaiter + 'static,
    {
        config.validate()?;

        let authenticator = BearerAuthenticator::new(&config.cluster_uuid, TokenScope::DevLxd)
            .with_leeway(config.token_leeway);
        let devices = DeviceOwnershipService::new(backend, Arc::new(CustomVolumeValidator));
        let operations = OperationWaitBridge::new(waiter).with_max_wait(config.max_wait);

        Ok(Self {
            authenticator: Arc::new(authenticator),
            identities,
            devices: Arc::new(devices),
            operations: Arc::new(operations),
            hub: EventHub::with_transport(transport, config.hub_config()),
            event_target: config.event_target.clone(),
        })
    }
}

/// Guest API router with authentication applied to every route.
pub fn router(state: AppState) -> Router {
    let auth = BearerAuthLayer::new(
        Arc::clone(&state.authenticator),
        Arc::clone(&state.identities),
    );

    Router::new()
        .route(
            "/1.0/instances/:name",
            get(instances::get_instance)
                .patch(instances::patch_instance)
                .fallback(handlers::not_implemented),
        )
        .route(
            "/1.0/operations/:id/wait",
            get(operations::wait_operation).fallback(handlers::not_implemented),
        )
        .route(
            "/1.0/events",
            get(events::stream_events).fallback(handlers::not_implemented),
        )
        .fallback(handlers::not_found)
        .layer(auth)
        .with_state(state)
}

/// The guest API server.
pub struct GuestApiService {
    config: GuestApiConfig,
    state: AppState,
}

impl GuestApiService {
    pub fn new(config: GuestApiConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &GuestApiConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind `config.listen` and serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.listen).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves, then
    /// shut the event hub down.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %listener.local_addr()?, "Guest API listening");
        let router = self.router();
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        self.state.hub.shutdown();
        info!("Guest API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::response::ResponseEnvelope;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::{Duration as ChronoDuration, Utc};
    use gc_01_bearer_auth::TokenCodec;
    use gc_02_device_ownership::{InMemoryInstanceBackend, MANAGEMENT_VOLUMES_KEY};
    use gc_03_operation_wait::InMemoryOperations;
    use serde_json::{json, Value};
    use shared_bus::MemoryTransport;
    use shared_types::{
        Identity, IdentityType, InMemoryIdentityCache, Instance, Operation, OperationStatus,
    };
    use tower::ServiceExt;

    const CLUSTER: &str = "cluster-42";

    struct Harness {
        router: Router,
        operations: Arc<InMemoryOperations>,
        bearer: String,
    }

    fn harness() -> Harness {
        let svc1 = Identity::new("svc-1", IdentityType::DevLxdBearer, b"secret-1".to_vec());
        let token = TokenCodec::issue(
            &svc1.secret,
            None,
            "svc-1",
            CLUSTER,
            TokenScope::DevLxd,
            Utc::now() + ChronoDuration::hours(1),
        )
        .unwrap();
        let identities = InMemoryIdentityCache::new();
        identities.insert(svc1);

        let backend = InMemoryInstanceBackend::new();
        let mut vm1 = Instance::new("vm1");
        vm1.config.insert(MANAGEMENT_VOLUMES_KEY.into(), "true".into());
        backend.insert(vm1);

        let operations = Arc::new(InMemoryOperations::new());
        let config = GuestApiConfig {
            cluster_uuid: CLUSTER.into(),
            ..Default::default()
        };
        let state = AppState::from_config(
            &config,
            Arc::new(identities),
            Arc::new(backend),
            Arc::clone(&operations),
            Arc::new(MemoryTransport::new()),
        )
        .unwrap();

        Harness {
            router: router(state),
            operations,
            bearer: format!("Bearer {token}"),
        }
    }

    impl Harness {
        async fn send(&self, method: Method, uri: &str, body: Option<&str>, if_match: Option<&str>) -> (StatusCode, Option<String>, Value) {
            let mut builder = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, &self.bearer);
            if let Some(etag) = if_match {
                builder = builder.header(header::IF_MATCH, etag);
            }
            let body = match body {
                Some(json) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let etag = response
                .headers()
                .get(header::ETAG)
                .map(|v| v.to_str().unwrap().to_string());
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, etag, value)
        }
    }

    #[tokio::test]
    async fn test_get_instance_sets_etag() {
        let h = harness();
        let (status, etag, body) = h.send(Method::GET, "/1.0/instances/vm1", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(etag.unwrap().starts_with('"'));
        let envelope: ResponseEnvelope = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.metadata, json!({"name": "vm1", "devices": {}}));
    }

    #[tokio::test]
    async fn test_patch_then_stale_etag() {
        let h = harness();
        let (_, e0, _) = h.send(Method::GET, "/1.0/instances/vm1", None, None).await;
        let e0 = e0.unwrap();

        let add_a = r#"{"devices": {"vol-a": {"type": "disk", "pool": "p", "source": "vol-a", "path": "/mnt/a"}}}"#;
        let (status, e1, body) = h
            .send(Method::PATCH, "/1.0/instances/vm1", Some(add_a), Some(&e0))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"], json!({}));
        assert_ne!(e1.unwrap(), e0);

        let add_b = r#"{"devices": {"vol-b": {"type": "disk", "pool": "p", "source": "vol-b", "path": "/mnt/b"}}}"#;
        let (status, _, body) = h
            .send(Method::PATCH, "/1.0/instances/vm1", Some(add_b), Some(&e0))
            .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["type"], "error");
        assert_eq!(body["error_code"], 412);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let h = harness();
        let (status, _, _) = h
            .send(Method::PATCH, "/1.0/instances/vm1", Some("{not json"), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_501() {
        let h = harness();
        let (status, _, body) = h.send(Method::DELETE, "/1.0/instances/vm1", None, None).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["error_code"], 501);

        let (status, _, _) = h.send(Method::GET, "/1.0/nothing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_instance_is_404() {
        let h = harness();
        let (status, _, _) = h.send(Method::GET, "/1.0/instances/vm9", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_operation_wait() {
        let h = harness();
        let id = h.operations.create(Operation::new_task("Snapshot"));
        h.operations
            .update_status(id, OperationStatus::Success, "")
            .unwrap();

        let uri = format!("/1.0/operations/{id}/wait?timeout=5");
        let (status, _, body) = h.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["metadata"],
            json!({"id": id.to_string(), "status": "Success", "status_code": 200, "err": ""})
        );

        let (status, _, _) = h
            .send(Method::GET, "/1.0/operations/not-a-uuid/wait", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = h
            .send(Method::GET, &format!("/1.0/operations/{id}/wait?timeout=soon"), None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_requests_without_token_are_401() {
        let h = harness();
        let response = h
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/1.0/instances/vm1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_from_config_validates() {
        let result = AppState::from_config(
            &GuestApiConfig::default(),
            Arc::new(InMemoryIdentityCache::new()),
            Arc::new(InMemoryInstanceBackend::new()),
            Arc::new(InMemoryOperations::new()),
            Arc::new(MemoryTransport::new()),
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
