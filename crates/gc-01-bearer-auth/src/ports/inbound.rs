//! # Inbound Ports (Driving Ports / API)

use crate::domain::errors::AuthError;
use shared_types::{Identity, IdentityCache, IdentityType};

/// A bearer string that looks like a token for this cluster and scope.
///
/// Produced from unverified claims. Must still go through
/// [`BearerAuthApi::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerCandidate {
    /// Raw token, without the `Bearer ` prefix
    pub token: String,
    /// Unverified subject claim
    pub subject: String,
}

/// Bearer authentication for one cluster and scope.
pub trait BearerAuthApi: Send + Sync {
    /// Cheap pre-filter on an `Authorization` header value.
    fn is_candidate(&self, header_value: &str) -> Option<BearerCandidate>;

    /// Verify `token` for `subject` against the identity cache.
    ///
    /// # Errors
    /// * `AuthError::IdentityNotFound` - No bearer identity for `subject`
    /// * `AuthError::WrongIdentityType` - Identity belongs to another surface
    /// * `AuthError::TokenInvalid` - Any signature or claim failure
    fn authenticate(
        &self,
        token: &str,
        subject: &str,
        cache: &dyn IdentityCache,
        expected_type: IdentityType,
    ) -> Result<Identity, AuthError>;
}
