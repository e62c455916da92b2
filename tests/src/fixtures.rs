//! Shared fixtures: the `cluster-42` deployment with guest identity
//! `svc-1` and instance `vm1` that allows custom volume management.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use gc_01_bearer_auth::{TokenCodec, TokenScope};
use gc_02_device_ownership::{InMemoryInstanceBackend, MANAGEMENT_VOLUMES_KEY};
use gc_03_operation_wait::InMemoryOperations;
use gc_04_guest_api::{router, AppState, GuestApiConfig};
use serde_json::Value;
use shared_bus::MemoryTransport;
use shared_types::{DeviceConfig, Identity, IdentityType, InMemoryIdentityCache, Instance};
use std::sync::Arc;
use tower::ServiceExt;

pub const CLUSTER: &str = "cluster-42";
pub const EVENT_TARGET: &str = "host:8444";

pub fn guest_identity(name: &str) -> Identity {
    Identity::new(
        name,
        IdentityType::DevLxdBearer,
        format!("{name}-secret").into_bytes(),
    )
}

/// A one-hour guest-scope token for `identity`.
pub fn guest_token(identity: &Identity, salt: Option<&[u8]>) -> String {
    TokenCodec::issue(
        &identity.secret,
        salt,
        &identity.identifier,
        CLUSTER,
        TokenScope::DevLxd,
        Utc::now() + Duration::hours(1),
    )
    .expect("token issues")
}

pub fn volume(source: &str, path: &str) -> DeviceConfig {
    [("type", "disk"), ("pool", "default"), ("source", source), ("path", path)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn managed_instance(name: &str) -> Instance {
    let mut instance = Instance::new(name);
    instance
        .config
        .insert(MANAGEMENT_VOLUMES_KEY.into(), "true".into());
    instance
}

pub fn config() -> GuestApiConfig {
    GuestApiConfig {
        cluster_uuid: CLUSTER.into(),
        event_target: EVENT_TARGET.into(),
        ..Default::default()
    }
}

/// Fully wired guest API over in-memory collaborators.
pub struct Deployment {
    pub identities: Arc<InMemoryIdentityCache>,
    pub instances: Arc<InMemoryInstanceBackend>,
    pub operations: Arc<InMemoryOperations>,
    pub transport: MemoryTransport,
    pub state: AppState,
}

impl Deployment {
    pub fn new() -> Self {
        let identities = Arc::new(InMemoryIdentityCache::new());
        identities.insert(guest_identity("svc-1"));

        let instances = Arc::new(InMemoryInstanceBackend::new());
        instances.insert(managed_instance("vm1"));

        let operations = Arc::new(InMemoryOperations::new());
        let transport = MemoryTransport::new();

        let state = AppState::from_config(
            &config(),
            identities.clone(),
            Arc::clone(&instances),
            Arc::clone(&operations),
            Arc::new(transport.clone()),
        )
        .expect("valid config");

        Self {
            identities,
            instances,
            operations,
            transport,
            state,
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Send one request as `bearer` and return status, `ETag` and JSON body.
    pub async fn request(
        &self,
        bearer: Option<&str>,
        method: Method,
        uri: &str,
        if_match: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
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
            .router()
            .oneshot(builder.body(body).expect("request builds"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, etag, json)
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new()
    }
}
