//! # Wait Errors

use thiserror::Error;

/// Errors from waiting on an operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WaitError {
    /// The id is not a UUID.
    #[error("invalid operation id {0:?}")]
    InvalidId(String),

    /// No operation with this id.
    #[error("operation {0} not found")]
    NotFound(String),

    /// The operation subsystem failed.
    #[error("internal error: {0}")]
    Internal(String),
}
