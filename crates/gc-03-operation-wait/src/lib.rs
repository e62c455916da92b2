//! # Operation Wait Subsystem (GC-03)
//!
//! Lets a guest block on a host operation it started and read back only
//! `{id, status, status_code, err}`. Everything else the host tracks about
//! the operation (resources, metadata, location) stays on the host side.
//!
//! ```text
//! guest ── GET /1.0/operations/{id}/wait?timeout=N ──→ OperationWaitBridge
//!                                                       │ parse id, bound timeout
//!                                                       ▼
//!                                                 OperationWaiter (host)
//!                                                       │ Operation
//!                                                       ▼
//!                                                 DevLxdOperation
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::InMemoryOperations;
pub use domain::errors::WaitError;
pub use ports::inbound::OperationWaitApi;
pub use ports::outbound::OperationWaiter;
pub use service::OperationWaitBridge;
