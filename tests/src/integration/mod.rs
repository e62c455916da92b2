//! Cross-crate integration flows.

pub mod auth_flows;
pub mod device_flows;
pub mod event_stream;
pub mod operation_flows;
