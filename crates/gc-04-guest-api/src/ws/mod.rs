//! WebSocket endpoints.

pub mod events;

pub use events::{EventsQuery, EVENT_BUFFER};
