//! `GET /1.0/events?type=a,b`
//!
//! Upgrades to a WebSocket, subscribes to the hub for the configured host
//! target and forwards matching events as text frames. The subscription is
//! taken before the upgrade so an unreachable host surfaces as an HTTP
//! error instead of an immediately closed socket, and events seen between
//! subscription and upgrade are buffered.
//!
//! The stream ends when the guest closes the socket, the socket errors, or
//! the hub fails the listener. Events that arrive while the guest is slow
//! are buffered up to [`EVENT_BUFFER`] and dropped beyond it.

use crate::domain::error::{ApiError, ApiResult};
use crate::service::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::Extension;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared_bus::{Event, EventListener};
use shared_types::Identity;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events buffered per stream before new ones are dropped.
pub const EVENT_BUFFER: usize = 256;

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Comma-separated event types; absent or empty means all.
    #[serde(rename = "type")]
    pub types: Option<String>,
}

impl EventsQuery {
    /// Type filter for the hub target.
    pub fn filter(&self) -> Option<HashSet<String>> {
        let types: HashSet<String> = self
            .types
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        (!types.is_empty()).then_some(types)
    }
}

pub async fn stream_events(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    query: Result<Query<EventsQuery>, QueryRejection>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let filter = query.filter();

    let listener = state.hub.subscribe(state.event_target.clone()).await?;
    info!(
        caller = %caller.identifier,
        listener = %listener.id(),
        types = ?filter,
        "Event stream opened"
    );

    // Buffer from here on so nothing is lost while the upgrade completes.
    let (tx, rx) = mpsc::channel::<Event>(EVENT_BUFFER);
    let dropped_for = caller.identifier.clone();
    listener.add_target(filter, move |event| {
        if tx.try_send(event).is_err() {
            warn!(caller = %dropped_for, "Event stream backlogged, dropping event");
        }
    });

    Ok(ws.on_upgrade(move |socket| forward(socket, listener, rx, caller.identifier)))
}

async fn forward(
    socket: WebSocket,
    listener: EventListener,
    mut rx: mpsc::Receiver<Event>,
    caller: String,
) {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                let text = match event.to_json() {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(caller = %caller, error = %err, "Failed to encode event");
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = listener.closed() => {
                if let Some(err) = listener.error() {
                    warn!(caller = %caller, error = %err, "Event source failed");
                }
                break;
            }
        }
    }

    listener.disconnect();
    let _ = sink.close().await;
    debug!(caller = %caller, "Event stream closed");
}
