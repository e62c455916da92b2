//! # Event Hub
//!
//! Multiplexes one transport connection per target key across any number of
//! listeners.
//!
//! ```text
//!                    ┌────────────── EventHub ──────────────┐
//!  transport ──────► │ reader ──► listener queues ──► drain │──► handlers
//!  (1 per target)    │ reaper ──► close at zero listeners   │
//!                    └──────────────────────────────────────┘
//! ```
//!
//! ## Locking
//!
//! All registry and connection-map mutation happens under one hub mutex.
//! It is never held across `connect`, a frame read, or a handler call.
//! Lock order is hub, then listener.
//!
//! ## Lifecycle
//!
//! - First subscriber for a key opens the connection and starts exactly one
//!   reader and one reaper task. Concurrent first subscribers share a single
//!   connect attempt through a per-key gate.
//! - A transport read error fails every listener on the connection with
//!   [`HubError::Transport`] in one locked step, then closes it.
//! - The reaper closes a connection found with zero listeners on a tick.
//!   A listener that joins before the tick reuses the connection.

use crate::config::HubConfig;
use crate::event::Event;
use crate::listener::{EventListener, Handler, ListenerId, ListenerShared};
use crate::transport::{EventConnection, EventTransport};
use crate::HubError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

type ConnectGate = Arc<tokio::sync::Mutex<()>>;

struct ConnectionEntry {
    generation: u64,
    listeners: Vec<ListenerId>,
    shutdown: watch::Sender<bool>,
}

#[derive(Default)]
struct HubState {
    connections: HashMap<String, ConnectionEntry>,
    listeners: HashMap<ListenerId, Arc<ListenerShared>>,
    gates: HashMap<String, ConnectGate>,
    next_generation: u64,
    shut_down: bool,
}

pub(crate) struct HubInner {
    transport: Arc<dyn EventTransport>,
    config: HubConfig,
    state: Mutex<HubState>,
    next_listener: AtomicU64,
}

/// Registry of listeners sharing one connection per target key.
///
/// Cheap to clone; clones share the registry. Dropping the last clone closes
/// every connection.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    /// Create a hub over `transport`.
    pub fn new<T: EventTransport>(transport: T, config: HubConfig) -> Self {
        Self::with_transport(Arc::new(transport), config)
    }

    /// Create a hub over a shared transport.
    pub fn with_transport(transport: Arc<dyn EventTransport>, config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                transport,
                config,
                state: Mutex::new(HubState::default()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    /// Hub configuration.
    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Register a listener on the shared connection for `target_key`,
    /// opening it if none exists.
    ///
    /// # Errors
    ///
    /// [`HubError::Connect`] if the connection could not be opened and
    /// [`HubError::HubShutdown`] after [`shutdown`](Self::shutdown).
    pub async fn subscribe(&self, target_key: impl Into<String>) -> Result<EventListener, HubError> {
        let key = target_key.into();
        if let Some(listener) = self.inner.attach(&key)? {
            return Ok(listener);
        }

        let gate = self.inner.gate(&key);
        let result = self.connect_gated(&key, &gate).await;
        self.inner.release_gate(&key, &gate);
        result
    }

    async fn connect_gated(&self, key: &str, gate: &ConnectGate) -> Result<EventListener, HubError> {
        let _guard = gate.lock().await;

        // Another subscriber may have connected while we waited.
        if let Some(listener) = self.inner.attach(key)? {
            return Ok(listener);
        }

        debug!(target_key = %key, "Opening shared connection");
        let conn = self.inner.transport.connect(key).await.map_err(|err| {
            warn!(target_key = %key, error = %err, "Shared connection failed to open");
            err
        })?;
        self.inner.install(key, conn)
    }

    /// Number of open shared connections.
    pub fn connection_count(&self) -> usize {
        self.inner.state.lock().connections.len()
    }

    /// Listeners registered on the connection for `target_key`.
    pub fn listener_count(&self, target_key: &str) -> usize {
        self.inner
            .state
            .lock()
            .connections
            .get(target_key)
            .map_or(0, |entry| entry.listeners.len())
    }

    /// Whether a shared connection for `target_key` is open.
    pub fn is_connected(&self, target_key: &str) -> bool {
        self.inner.state.lock().connections.contains_key(target_key)
    }

    /// Fail every listener with [`HubError::HubShutdown`], close every
    /// connection and refuse further subscriptions.
    pub fn shutdown(&self) {
        let (connections, listeners) = {
            let mut state = self.inner.state.lock();
            if state.shut_down {
                return;
            }
            state.shut_down = true;

            let connections = state.connections.len();
            for (_, entry) in state.connections.drain() {
                entry.shutdown.send_replace(true);
            }
            let listeners = state.listeners.len();
            for (_, listener) in state.listeners.drain() {
                listener.fail(HubError::HubShutdown);
            }
            state.gates.clear();
            (connections, listeners)
        };
        info!(connections, listeners, "Event hub shut down");
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("EventHub")
            .field("connections", &state.connections.len())
            .field("listeners", &state.listeners.len())
            .field("shut_down", &state.shut_down)
            .finish()
    }
}

impl HubInner {
    fn new_listener(self: &Arc<Self>, key: &str) -> (Arc<ListenerShared>, EventListener) {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let shared = Arc::new(ListenerShared::new(id, key.to_string()));
        let handle = EventListener::new(Arc::clone(&shared), Arc::downgrade(self));
        (shared, handle)
    }

    /// Join an existing connection, if any.
    fn attach(self: &Arc<Self>, key: &str) -> Result<Option<EventListener>, HubError> {
        let mut state = self.state.lock();
        if state.shut_down {
            return Err(HubError::HubShutdown);
        }
        if !state.connections.contains_key(key) {
            return Ok(None);
        }

        let (shared, handle) = self.new_listener(key);
        let id = shared.id;
        state.listeners.insert(id, shared);
        if let Some(entry) = state.connections.get_mut(key) {
            entry.listeners.push(id);
        }
        debug!(target_key = %key, listener = %id, "Listener attached to shared connection");
        Ok(Some(handle))
    }

    /// Register a freshly opened connection with its first listener and
    /// start its reader and reaper.
    fn install(
        self: &Arc<Self>,
        key: &str,
        conn: Box<dyn EventConnection>,
    ) -> Result<EventListener, HubError> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, generation) = {
            let mut state = self.state.lock();
            if state.shut_down {
                drop(state);
                tokio::spawn(close_connection(conn));
                return Err(HubError::HubShutdown);
            }

            let generation = state.next_generation;
            state.next_generation += 1;

            let (shared, handle) = self.new_listener(key);
            let id = shared.id;
            state.listeners.insert(id, shared);
            state.connections.insert(
                key.to_string(),
                ConnectionEntry {
                    generation,
                    listeners: vec![id],
                    shutdown: shutdown_tx,
                },
            );
            (handle, generation)
        };

        tokio::spawn(run_reader(
            Arc::downgrade(self),
            key.to_string(),
            generation,
            conn,
            shutdown_rx.clone(),
        ));
        tokio::spawn(run_reaper(
            Arc::downgrade(self),
            key.to_string(),
            generation,
            self.config.reaper_interval,
            shutdown_rx,
        ));

        info!(target_key = %key, generation, "Shared connection opened");
        Ok(handle)
    }

    fn gate(&self, key: &str) -> ConnectGate {
        let mut state = self.state.lock();
        Arc::clone(state.gates.entry(key.to_string()).or_default())
    }

    fn release_gate(&self, key: &str, gate: &ConnectGate) {
        let mut state = self.state.lock();
        // Only the map and the caller hold it: nobody else is waiting.
        if Arc::strong_count(gate) == 2 {
            state.gates.remove(key);
        }
    }

    pub(crate) fn remove_listener(&self, listener: &ListenerShared) {
        let mut state = self.state.lock();
        if state.listeners.remove(&listener.id).is_none() {
            return;
        }
        if let Some(entry) = state.connections.get_mut(&listener.target_key) {
            entry.listeners.retain(|id| *id != listener.id);
        }
        listener.cancel();
        debug!(
            target_key = %listener.target_key,
            listener = %listener.id,
            "Listener disconnected"
        );
    }

    fn dispatch(&self, key: &str, generation: u64, frame: &[u8]) {
        let event = match Event::decode(frame) {
            Ok(event) => event,
            Err(err) => {
                warn!(target_key = %key, error = %err, "Dropping undecodable event frame");
                return;
            }
        };

        let deliveries: Vec<(Arc<ListenerShared>, Vec<Handler>)> = {
            let state = self.state.lock();
            let Some(entry) = state
                .connections
                .get(key)
                .filter(|entry| entry.generation == generation)
            else {
                return;
            };
            entry
                .listeners
                .iter()
                .filter_map(|id| state.listeners.get(id))
                .map(|listener| (Arc::clone(listener), listener.matching_handlers(&event.event_type)))
                .filter(|(_, handlers)| !handlers.is_empty())
                .collect()
        };

        trace!(
            target_key = %key,
            event_type = %event.event_type,
            deliveries = deliveries.len(),
            "Dispatching event"
        );

        for (listener, handlers) in deliveries {
            if listener.enqueue(handlers, &event) {
                tokio::task::spawn_blocking(move || listener.drain());
            }
        }
    }

    fn fail_connection(&self, key: &str, generation: u64, err: HubError) {
        let failed = {
            let mut state = self.state.lock();
            let current = state
                .connections
                .get(key)
                .is_some_and(|entry| entry.generation == generation);
            if !current {
                return;
            }
            let Some(entry) = state.connections.remove(key) else {
                return;
            };
            entry.shutdown.send_replace(true);

            let mut failed = 0usize;
            for id in &entry.listeners {
                if let Some(listener) = state.listeners.remove(id) {
                    listener.fail(err.clone());
                    failed += 1;
                }
            }
            failed
        };
        warn!(target_key = %key, error = %err, listeners = failed, "Shared connection failed");
    }

    /// Close the connection if it has no listeners. Returns true when the
    /// reaper has nothing left to watch.
    fn reap_if_idle(&self, key: &str, generation: u64) -> bool {
        let mut state = self.state.lock();
        match state.connections.get(key) {
            Some(entry) if entry.generation == generation => {
                if !entry.listeners.is_empty() {
                    return false;
                }
            }
            _ => return true,
        }
        if let Some(entry) = state.connections.remove(key) {
            entry.shutdown.send_replace(true);
        }
        drop(state);
        info!(target_key = %key, generation, "Closing idle shared connection");
        true
    }
}

async fn run_reader(
    hub: Weak<HubInner>,
    key: String,
    generation: u64,
    mut conn: Box<dyn EventConnection>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            // Also resolves when the hub is dropped with the sender.
            _ = shutdown.changed() => break,
            frame = conn.next_frame() => {
                let Some(hub) = hub.upgrade() else { break };
                match frame {
                    Ok(Some(frame)) => hub.dispatch(&key, generation, &frame),
                    Ok(None) => {
                        hub.fail_connection(
                            &key,
                            generation,
                            HubError::Transport("connection closed by peer".into()),
                        );
                        break;
                    }
                    Err(err) => {
                        hub.fail_connection(&key, generation, err);
                        break;
                    }
                }
            }
        }
    }
    conn.close().await;
    debug!(target_key = %key, generation, "Reader stopped");
}

async fn run_reaper(
    hub: Weak<HubInner>,
    key: String,
    generation: u64,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval = interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let Some(hub) = hub.upgrade() else { break };
                if hub.reap_if_idle(&key, generation) {
                    break;
                }
            }
        }
    }
    trace!(target_key = %key, generation, "Reaper stopped");
}

async fn close_connection(mut conn: Box<dyn EventConnection>) {
    conn.close().await;
}
