//! # Ports Layer
//!
//! - **Inbound (Driving)**: `DeviceOwnershipApi`, used by the HTTP layer
//! - **Outbound (Driven)**: `InstanceBackend`, the instance store

pub mod inbound;
pub mod outbound;
