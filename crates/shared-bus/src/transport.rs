//! # Transports
//!
//! The hub is agnostic of the wire. A transport opens one
//! [`EventConnection`] per target key; the hub's reader task owns it and
//! pulls frames until it fails or the hub closes it.

use crate::HubError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Opens shared connections to downstream targets.
#[async_trait]
pub trait EventTransport: Send + Sync + 'static {
    /// Open a connection to `target`.
    async fn connect(&self, target: &str) -> Result<Box<dyn EventConnection>, HubError>;
}

/// One open connection, read by exactly one reader task.
#[async_trait]
pub trait EventConnection: Send + 'static {
    /// Read the next frame.
    ///
    /// `Ok(None)` means the peer ended the stream. Must be cancellation safe.
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, HubError>;

    /// Close the connection. Best effort.
    async fn close(&mut self);
}

type FrameSender = mpsc::UnboundedSender<Result<Vec<u8>, HubError>>;

#[derive(Default)]
struct MemoryInner {
    connects: AtomicUsize,
    closes: AtomicUsize,
    feeds: Mutex<HashMap<String, FrameSender>>,
    connect_delay: Mutex<Option<Duration>>,
    refuse: Mutex<Option<String>>,
}

/// In-process transport. Frames and failures are injected by the caller.
///
/// Used by tests and by embedders that already have events in memory.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
}

impl MemoryTransport {
    /// Create a transport with no open connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every connect by `delay`.
    #[must_use]
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        *self.inner.connect_delay.lock() = Some(delay);
        self
    }

    /// Make subsequent connects fail with `reason`. `None` restores them.
    pub fn refuse_connects(&self, reason: Option<String>) {
        *self.inner.refuse.lock() = reason;
    }

    /// Total connections opened.
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Total connections closed by the hub.
    pub fn close_count(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    /// Whether an open connection for `target` exists.
    pub fn is_open(&self, target: &str) -> bool {
        self.inner
            .feeds
            .lock()
            .get(target)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Deliver a raw frame on the open connection for `target`.
    ///
    /// Returns false if no connection is open.
    pub fn push_frame(&self, target: &str, frame: impl Into<Vec<u8>>) -> bool {
        self.send(target, Ok(frame.into()))
    }

    /// Fail the open connection for `target` with a read error.
    pub fn push_error(&self, target: &str, reason: impl Into<String>) -> bool {
        self.send(target, Err(HubError::Transport(reason.into())))
    }

    fn send(&self, target: &str, item: Result<Vec<u8>, HubError>) -> bool {
        self.inner
            .feeds
            .lock()
            .get(target)
            .is_some_and(|tx| tx.send(item).is_ok())
    }
}

#[async_trait]
impl EventTransport for MemoryTransport {
    async fn connect(&self, target: &str) -> Result<Box<dyn EventConnection>, HubError> {
        let delay = *self.inner.connect_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = self.inner.refuse.lock().clone() {
            return Err(HubError::Connect {
                target: target.to_string(),
                reason,
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.feeds.lock().insert(target.to_string(), tx);
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        debug!(target = %target, "Memory connection opened");

        Ok(Box::new(MemoryConnection {
            rx,
            inner: Arc::clone(&self.inner),
            closed: false,
        }))
    }
}

struct MemoryConnection {
    rx: mpsc::UnboundedReceiver<Result<Vec<u8>, HubError>>,
    inner: Arc<MemoryInner>,
    closed: bool,
}

#[async_trait]
impl EventConnection for MemoryConnection {
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, HubError> {
        match self.rx.recv().await {
            Some(item) => item.map(Some),
            None => Ok(None),
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.rx.close();
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
    }
}
