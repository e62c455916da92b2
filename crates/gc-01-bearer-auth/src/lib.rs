//! # Bearer Authentication Subsystem (GC-01)
//!
//! Issues and verifies the bearer tokens guests present on the guest
//! channel.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): claims, token codec, errors
//! - **Ports Layer** (`ports/`): `BearerAuthApi` inbound, identity cache outbound
//! - **Service Layer** (`service.rs`): `BearerAuthenticator`
//!
//! ## Security Notes
//!
//! - **Audience separation**: guest tokens carry `devlxd:<cluster>`,
//!   administrative tokens `lxd:<cluster>`. Each authenticator accepts one.
//! - **Type check before signature**: an identity recorded for the other
//!   surface is refused even if its token would verify.
//! - **Opaque failures**: verification detail is logged, never returned.
//! - `TokenCodec::inspect` is a pre-filter only. It is a separate function
//!   from verification so call sites cannot mistake one for the other.

pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::claims::{issuer, Audience, TokenClaims, TokenScope, UnverifiedClaims};
pub use domain::codec::{TokenCodec, NOT_BEFORE_SKEW_SECS, TOKEN_ALGORITHM};
pub use domain::errors::AuthError;
pub use ports::inbound::{BearerAuthApi, BearerCandidate};
pub use service::{BearerAuthenticator, DEFAULT_LEEWAY};
