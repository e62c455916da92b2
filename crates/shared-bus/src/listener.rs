//! # Listeners and Targets
//!
//! A listener is the caller's handle on a hub registration. It owns a list
//! of targets, each a type filter plus a handler. Dropping the listener
//! disconnects it.
//!
//! Deliveries to one listener are queued in the order the reader decoded
//! them and drained by at most one blocking task at a time, so a listener
//! sees events in transport order. Different listeners drain concurrently.

use crate::event::Event;
use crate::hub::HubInner;
use crate::HubError;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;

/// Event callback. Runs on the blocking pool, in order per listener.
pub type Handler = Arc<dyn Fn(Event) + Send + Sync>;

/// Hub-unique listener identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Listener-unique target identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

/// A type filter with its handler.
#[derive(Clone)]
pub struct EventTarget {
    id: TargetId,
    filter: Option<HashSet<String>>,
    handler: Handler,
}

impl EventTarget {
    /// Target identifier.
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// `None` accepts every event type.
    pub fn filter(&self) -> Option<&HashSet<String>> {
        self.filter.as_ref()
    }

    /// Whether this target wants events of `event_type`.
    pub fn matches(&self, event_type: &str) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |types| types.contains(event_type))
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTarget")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct DeliveryQueue {
    pending: VecDeque<(Handler, Event)>,
    draining: bool,
}

/// State shared between a listener handle and the hub registry.
pub(crate) struct ListenerShared {
    pub(crate) id: ListenerId,
    pub(crate) target_key: String,
    targets: Mutex<Vec<EventTarget>>,
    queue: Mutex<DeliveryQueue>,
    error: Mutex<Option<HubError>>,
    cancel: watch::Sender<bool>,
    next_target: AtomicU64,
}

impl ListenerShared {
    pub(crate) fn new(id: ListenerId, target_key: String) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            id,
            target_key,
            targets: Mutex::new(Vec::new()),
            queue: Mutex::new(DeliveryQueue::default()),
            error: Mutex::new(None),
            cancel,
            next_target: AtomicU64::new(0),
        }
    }

    /// Handlers of every target accepting `event_type`, in registration order.
    pub(crate) fn matching_handlers(&self, event_type: &str) -> Vec<Handler> {
        self.targets
            .lock()
            .iter()
            .filter(|t| t.matches(event_type))
            .map(|t| Arc::clone(&t.handler))
            .collect()
    }

    /// Queue `event` for each of `handlers`. Returns true if the caller must
    /// start a drain task; false if one is already running.
    pub(crate) fn enqueue(&self, handlers: Vec<Handler>, event: &Event) -> bool {
        let mut queue = self.queue.lock();
        queue
            .pending
            .extend(handlers.into_iter().map(|handler| (handler, event.clone())));
        if queue.draining || queue.pending.is_empty() {
            return false;
        }
        queue.draining = true;
        true
    }

    /// Run queued deliveries in order until the queue is empty. Blocking.
    pub(crate) fn drain(&self) {
        loop {
            let next = {
                let mut queue = self.queue.lock();
                if self.is_cancelled() {
                    queue.pending.clear();
                }
                match queue.pending.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        queue.draining = false;
                        return;
                    }
                }
            };
            let (handler, event) = next;
            handler(event);
        }
    }

    /// Record a terminal error and fire the cancel signal.
    pub(crate) fn fail(&self, err: HubError) {
        {
            let mut slot = self.error.lock();
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        self.cancel();
    }

    pub(crate) fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Caller-owned registration on an [`EventHub`](crate::EventHub).
pub struct EventListener {
    shared: Arc<ListenerShared>,
    hub: Weak<HubInner>,
}

impl EventListener {
    pub(crate) fn new(shared: Arc<ListenerShared>, hub: Weak<HubInner>) -> Self {
        Self { shared, hub }
    }

    /// Listener identifier.
    pub fn id(&self) -> ListenerId {
        self.shared.id
    }

    /// Target key this listener's connection serves.
    pub fn target_key(&self) -> &str {
        &self.shared.target_key
    }

    /// Register a handler for events whose type is in `filter`, or for all
    /// events when `filter` is `None`.
    pub fn add_target<F>(&self, filter: Option<HashSet<String>>, handler: F) -> TargetId
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        let id = TargetId(self.shared.next_target.fetch_add(1, Ordering::Relaxed));
        self.shared.targets.lock().push(EventTarget {
            id,
            filter,
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove a target. Returns false if it was not registered.
    pub fn remove_target(&self, id: TargetId) -> bool {
        let mut targets = self.shared.targets.lock();
        let before = targets.len();
        targets.retain(|t| t.id != id);
        targets.len() != before
    }

    /// Number of registered targets.
    pub fn target_count(&self) -> usize {
        self.shared.targets.lock().len()
    }

    /// Leave the hub. Idempotent.
    ///
    /// The shared connection is left to the reaper, which closes it once no
    /// listener remains.
    pub fn disconnect(&self) {
        match self.hub.upgrade() {
            Some(hub) => hub.remove_listener(&self.shared),
            None => self.shared.cancel(),
        }
    }

    /// False once disconnected or failed.
    pub fn is_active(&self) -> bool {
        !self.shared.is_cancelled()
    }

    /// Terminal error, if the listener was failed by the hub.
    pub fn error(&self) -> Option<HubError> {
        self.shared.error.lock().clone()
    }

    /// Resolve once the listener is disconnected or failed.
    pub async fn closed(&self) {
        let mut rx = self.shared.cancel.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("id", &self.shared.id)
            .field("target_key", &self.shared.target_key)
            .field("active", &self.is_active())
            .finish()
    }
}
