//! # Authentication Errors
//!
//! Verification detail never appears in these messages. It is logged at
//! debug level where the failure happens and collapsed to `TokenInvalid`.

use shared_types::IdentityType;
use thiserror::Error;

/// Errors from issuing or authenticating bearer tokens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No token, or not a token for this cluster and scope.
    #[error("not authenticated")]
    Unauthenticated,

    /// The token subject has no identity in the cache.
    #[error("identity not found")]
    IdentityNotFound,

    /// The identity exists but belongs to another API surface.
    #[error("identity type is not allowed on this API")]
    WrongIdentityType {
        /// Type this authenticator accepts
        expected: IdentityType,
        /// Type recorded for the identity
        actual: IdentityType,
    },

    /// Signature, claims or expiry did not verify.
    #[error("token is not valid")]
    TokenInvalid,

    /// Token could not be built or signed.
    #[error("failed to issue token: {0}")]
    Issue(String),
}

impl AuthError {
    /// Whether this maps to a forbidden-class response rather than an
    /// unauthenticated one.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::WrongIdentityType { .. } | Self::TokenInvalid)
    }
}
