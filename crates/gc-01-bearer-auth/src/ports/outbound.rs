//! # Outbound Ports (Driven Ports / SPI)
//!
//! Identities are owned by an external collaborator and resolved through
//! the shared [`IdentityCache`] port. Lookups are keyed by
//! `(AuthenticationMethod::Bearer, subject)` for both token scopes.

pub use shared_types::{AuthenticationMethod, Identity, IdentityCache};
