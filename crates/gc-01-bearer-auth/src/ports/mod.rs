//! # Ports Layer
//!
//! - **Inbound (Driving)**: bearer authentication API used by the HTTP layer
//! - **Outbound (Driven)**: the identity cache tokens are verified against

pub mod inbound;
pub mod outbound;
