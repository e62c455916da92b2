//! Middleware stack for the guest API.

pub mod auth;

pub use auth::{BearerAuthLayer, BearerAuthService, GUEST_IDENTITY_TYPE};
