//! # Bearer Authenticator
//!
//! Implements [`BearerAuthApi`] for one cluster and one token scope.
//!
//! ## Flow
//!
//! 1. `is_candidate`: strip `Bearer `, inspect claims unverified, require
//!    the exact issuer and audience for this cluster and scope.
//! 2. `authenticate`: resolve the identity, check its type, then verify
//!    HS256 with the identity secret (or the key derived from `jti`),
//!    issuer, audience, `exp`, `iat` and `nbf`.
//!
//! Every verification failure is reported as `TokenInvalid`. The
//! underlying reason is only logged.

use crate::domain::claims::{issuer, TokenClaims, TokenScope};
use crate::domain::codec::{signing_key, TokenCodec, TOKEN_ALGORITHM};
use crate::domain::errors::AuthError;
use crate::ports::inbound::{BearerAuthApi, BearerCandidate};
use jsonwebtoken::{decode, DecodingKey, Validation};
use shared_types::{AuthenticationMethod, Identity, IdentityCache, IdentityType};
use std::time::Duration;
use tracing::debug;

/// Clock-skew allowance on `nbf` and `exp`.
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(60);

const BEARER_PREFIX: &str = "Bearer ";

/// Verifies bearer tokens for one cluster and scope.
#[derive(Debug, Clone)]
pub struct BearerAuthenticator {
    issuer: String,
    audience: String,
    scope: TokenScope,
    leeway: Duration,
}

impl BearerAuthenticator {
    /// Authenticator for `scope` tokens of `cluster_uuid`.
    pub fn new(cluster_uuid: &str, scope: TokenScope) -> Self {
        Self {
            issuer: issuer(cluster_uuid),
            audience: scope.audience(cluster_uuid),
            scope,
            leeway: DEFAULT_LEEWAY,
        }
    }

    /// Override the clock-skew leeway.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Scope this authenticator accepts.
    pub fn scope(&self) -> TokenScope {
        self.scope
    }

    /// Expected `aud` value.
    pub fn audience(&self) -> &str {
        &self.audience
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = self.leeway.as_secs();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        // jsonwebtoken has no required-claim check for `iat`; it is enforced
        // by `TokenClaims::iat` being non-optional.
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation
    }

    fn verify(&self, token: &str, identity: &Identity) -> Result<TokenClaims, String> {
        let unverified = TokenCodec::inspect(token).map_err(|e| e.to_string())?;
        let validation = self.validation();

        let data = match unverified.id {
            Some(jti) => {
                let salt = hex::decode(&jti).map_err(|e| format!("malformed jti: {e}"))?;
                let key = signing_key(&identity.secret, &salt).map_err(|e| e.to_string())?;
                decode::<TokenClaims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
            }
            None => decode::<TokenClaims>(
                token,
                &DecodingKey::from_secret(&identity.secret),
                &validation,
            ),
        }
        .map_err(|e| e.to_string())?;

        if data.claims.sub != identity.identifier {
            return Err("subject does not match identity".into());
        }
        Ok(data.claims)
    }
}

impl BearerAuthApi for BearerAuthenticator {
    fn is_candidate(&self, header_value: &str) -> Option<BearerCandidate> {
        let token = header_value.strip_prefix(BEARER_PREFIX)?.trim();
        if token.is_empty() {
            return None;
        }

        let claims = TokenCodec::inspect(token).ok()?;
        if claims.issuer.as_deref() != Some(self.issuer.as_str()) {
            return None;
        }
        if claims.audience.len() != 1 || claims.audience[0] != self.audience {
            return None;
        }
        let subject = claims.subject.filter(|s| !s.is_empty())?;

        Some(BearerCandidate {
            token: token.to_string(),
            subject,
        })
    }

    fn authenticate(
        &self,
        token: &str,
        subject: &str,
        cache: &dyn IdentityCache,
        expected_type: IdentityType,
    ) -> Result<Identity, AuthError> {
        let Some(identity) = cache.get(AuthenticationMethod::Bearer, subject) else {
            debug!(subject, "Bearer identity not found");
            return Err(AuthError::IdentityNotFound);
        };

        if identity.identity_type != expected_type {
            debug!(
                subject,
                expected = ?expected_type,
                actual = ?identity.identity_type,
                "Bearer identity has wrong type"
            );
            return Err(AuthError::WrongIdentityType {
                expected: expected_type,
                actual: identity.identity_type,
            });
        }

        match self.verify(token, &identity) {
            Ok(_) => {
                debug!(subject, scope = %self.scope, "Bearer token verified");
                Ok(identity)
            }
            Err(reason) => {
                debug!(subject, reason = %reason, "Bearer token rejected");
                Err(AuthError::TokenInvalid)
            }
        }
    }
}
