//! # Shared Types Crate
//!
//! Cross-subsystem types for the guest channel: identities and the cache
//! they are resolved from, instances with their device sets, and operation
//! records.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every type crossing a crate boundary is
//!   defined here.
//! - **Read-only collaborators**: The identity cache is consumed, never
//!   mutated, by the guest channel.
//! - **Narrow projections**: Records that reach the guest (`DevLxdOperation`)
//!   are separate types, not filtered views of internal ones.

pub mod identity;
pub mod instance;
pub mod operation;

pub use identity::{
    AuthenticationMethod, Identity, IdentityCache, IdentityType, InMemoryIdentityCache,
};
pub use instance::{
    device_type, DeviceConfig, Devices, Instance, InstanceConfig, InstanceType, DEVICE_TYPE_KEY,
};
pub use operation::{DevLxdOperation, Operation, OperationStatus};
