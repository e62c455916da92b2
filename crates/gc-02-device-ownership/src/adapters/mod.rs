//! # Adapters
//!
//! Concrete outbound port implementations.

pub mod memory;

pub use memory::InMemoryInstanceBackend;
