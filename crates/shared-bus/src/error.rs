//! Event hub errors.

use thiserror::Error;

/// Errors raised by the event hub and its transports.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    /// Opening the shared connection failed.
    #[error("failed to connect to {target}: {reason}")]
    Connect {
        /// Target key the connection was opened for.
        target: String,
        /// Transport-level reason.
        reason: String,
    },

    /// The shared connection died. Terminal for every listener on it.
    #[error("event transport failed: {0}")]
    Transport(String),

    /// A frame could not be decoded as an event envelope.
    ///
    /// Logged and skipped by the reader; never delivered to listeners.
    #[error("event frame skipped: {0}")]
    Decode(String),

    /// The hub was shut down while the listener was registered.
    #[error("event hub shut down")]
    HubShutdown,
}
