//! # Shared Bus - Host Event Distribution
//!
//! Delivers host-originated events to guest-channel consumers over one
//! shared transport connection per downstream target.
//!
//! ## Model
//!
//! ```text
//! ┌───────────┐   subscribe()   ┌──────────────┐   1 connection   ┌────────┐
//! │ Listener  │ ──────────────► │   EventHub   │ ◄──────────────  │ Target │
//! │ + targets │ ◄── handlers ── │ reader/reaper│                  └────────┘
//! └───────────┘                 └──────────────┘
//! ```
//!
//! - **No singleton:** an [`EventHub`] is an explicit object owned by its
//!   creator.
//! - **Terminal failures:** a dead connection fails every listener on it
//!   with [`HubError::Transport`]. Retrying means subscribing again.
//! - **Malformed frames** are logged and skipped.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod event;
pub mod hub;
pub mod listener;
pub mod transport;
pub mod websocket;

// Re-export main types
pub use config::{HubConfig, DEFAULT_REAPER_INTERVAL};
pub use error::HubError;
pub use event::Event;
pub use hub::EventHub;
pub use listener::{EventListener, EventTarget, Handler, ListenerId, TargetId};
pub use transport::{EventConnection, EventTransport, MemoryTransport};
pub use websocket::{WebSocketTransport, EVENTS_PATH};
