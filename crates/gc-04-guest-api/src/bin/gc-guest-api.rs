//! Standalone guest API server.
//!
//! Instances, identities and operations live in memory; events are read
//! from the host over WebSocket at `event_target`.
//!
//! ```text
//! gc-guest-api [config.toml]
//! ```

use anyhow::Context;
use gc_02_device_ownership::InMemoryInstanceBackend;
use gc_03_operation_wait::InMemoryOperations;
use gc_04_guest_api::{AppState, GuestApiConfig, GuestApiService};
use guest_telemetry::{init_telemetry, log_event, TelemetryConfig};
use shared_bus::WebSocketTransport;
use shared_types::InMemoryIdentityCache;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("initializing telemetry")?;

    let config = match std::env::args().nth(1) {
        Some(path) => GuestApiConfig::from_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => GuestApiConfig::default(),
    }
    .with_env_overrides()?;

    let state = AppState::from_config(
        &config,
        Arc::new(InMemoryIdentityCache::new()),
        Arc::new(InMemoryInstanceBackend::new()),
        Arc::new(InMemoryOperations::new()),
        Arc::new(WebSocketTransport::new()),
    )?;

    log_event!(
        info,
        "gc-04",
        "Starting guest API",
        listen = %config.listen,
        cluster = %config.cluster_uuid
    );

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log_event!(error, "gc-04", "Failed to listen for shutdown signal", error = %err);
        }
    };
    GuestApiService::new(config, state)
        .run(shutdown)
        .await
        .context("serving guest API")
}
