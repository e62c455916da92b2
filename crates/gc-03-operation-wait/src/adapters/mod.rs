//! # Adapters Layer

pub mod memory;

pub use memory::InMemoryOperations;
