//! # Domain Layer
//!
//! Configuration, the error type every handler returns, and the response
//! envelope both are rendered into.

pub mod config;
pub mod error;
pub mod response;
