//! # Guest API (GC-04)
//!
//! The HTTP surface an untrusted guest talks to.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GUEST API (gc-04)                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │   BearerAuthLayer   (401 / 403, Identity into extensions)    │
//! │          │                                                   │
//! │   ┌──────┴───────────┬──────────────────┬────────────────┐   │
//! │   │ instances        │ operations/wait  │ events (ws)    │   │
//! │   └──────┬───────────┴────────┬─────────┴───────┬────────┘   │
//! └──────────┼────────────────────┼─────────────────┼────────────┘
//!            ▼                    ▼                 ▼
//!      gc-02 ownership      gc-03 wait        shared-bus hub
//! ```
//!
//! Every response body is a [`ResponseEnvelope`]. Errors carry a short
//! message and never key material or internal detail.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod service;
pub mod ws;

// Re-exports for public API
pub use domain::config::{ConfigError, GuestApiConfig, DEFAULT_PORT};
pub use domain::error::{ApiError, ApiResult};
pub use domain::response::{ResponseEnvelope, ResponseType};
pub use handlers::instances::InstancePatchRequest;
pub use middleware::{BearerAuthLayer, GUEST_IDENTITY_TYPE};
pub use service::{router, AppState, GuestApiService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
