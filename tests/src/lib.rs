//! # Guest Channel Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # identities, tokens, instances, a wired router
//! └── integration/      # cross-crate flows
//!     ├── device_flows.rs
//!     ├── auth_flows.rs
//!     ├── operation_flows.rs
//!     └── event_stream.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gc-tests
//! cargo bench -p gc-tests
//! ```

pub mod fixtures;
pub mod integration;
