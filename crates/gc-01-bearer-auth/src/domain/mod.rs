//! # Domain Layer
//!
//! Token claims, the codec that signs and inspects them, and errors.
//! No I/O and no identity lookups here.

pub mod claims;
pub mod codec;
pub mod errors;
