//! # Ownership Errors

use thiserror::Error;

/// Errors from viewing or patching a caller's devices.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OwnershipError {
    /// No such instance.
    #[error("instance {0} not found")]
    InstanceNotFound(String),

    /// Malformed request, such as an invalid device name.
    #[error("{0}")]
    BadRequest(String),

    /// Access validator rejection or ownership collision.
    #[error("{0}")]
    Forbidden(String),

    /// If-Match did not match the current owned-device ETag, or the
    /// instance changed between planning and applying.
    #[error("ETag doesn't match")]
    PreconditionFailed,

    /// Backend or encoding failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors reported by an instance backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// No such instance.
    #[error("instance {0} not found")]
    NotFound(String),

    /// The instance revision moved since the update was planned.
    #[error("instance revision changed")]
    RevisionConflict,

    /// Backend could not be reached or failed.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl From<BackendError> for OwnershipError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(name) => Self::InstanceNotFound(name),
            BackendError::RevisionConflict => Self::PreconditionFailed,
            BackendError::Unavailable(reason) => Self::Internal(reason),
        }
    }
}
