//! # Device Ownership Subsystem (GC-02)
//!
//! Lets a guest identity see and manage exactly the devices it owns on an
//! instance, under an optimistic-concurrency ETag.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): ownership map, ETag, validators, authorizer
//! - **Ports Layer** (`ports/`): `DeviceOwnershipApi` in, `InstanceBackend` out
//! - **Adapters** (`adapters/`): in-memory backend with revision checks
//! - **Service Layer** (`service.rs`): load, plan, compare-and-swap write
//!
//! ## Invariants
//!
//! - The visible set is always a subset of the expanded device set.
//! - The ETag covers only the visible set, so foreign changes never
//!   invalidate it.
//! - A patch is validated completely before anything is written, and the
//!   device map and owner keys are written together.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::InMemoryInstanceBackend;
pub use domain::authorizer::{DeviceOwnershipAuthorizer, DevicePatch, DeviceView, InstanceUpdate};
pub use domain::errors::{BackendError, OwnershipError};
pub use domain::etag::{compute_etag, etag_matches, quote};
pub use domain::ownership::{owner_key, parse_owner_key, OwnershipMap};
pub use domain::validator::{CustomVolumeValidator, DeviceAccessValidator, MANAGEMENT_VOLUMES_KEY};
pub use ports::inbound::DeviceOwnershipApi;
pub use ports::outbound::InstanceBackend;
pub use service::DeviceOwnershipService;
