//! # Ports Layer
//!
//! - **Inbound (Driving)**: `OperationWaitApi`, the guest-facing wait
//! - **Outbound (Driven)**: `OperationWaiter`, the host's long-poll primitive

pub mod inbound;
pub mod outbound;
