//! # Token Codec
//!
//! Builds and signs tokens (HS256), and reads claims without verification.
//!
//! ## Derived-key tokens
//!
//! When a salt is supplied the token is signed with
//! `derive_key(secret, salt, SIGNATURE, 32)` instead of the identity secret,
//! and the salt travels hex-encoded in `jti` so the verifier can derive the
//! same key.

use super::claims::{issuer, Audience, TokenClaims, TokenScope, UnverifiedClaims};
use super::errors::AuthError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use shared_crypto::{derive_key, DerivedKey, KeyUsage, MAX_DERIVED_KEY_LEN};
use std::collections::HashSet;

/// Signing algorithm for every token.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// How far `nbf` is back-dated from issue time, in seconds.
pub const NOT_BEFORE_SKEW_SECS: i64 = 1;

#[derive(Deserialize)]
struct LooseClaims {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    aud: Option<Audience>,
    #[serde(default)]
    jti: Option<String>,
}

/// Derive the signing key for a salted token.
pub fn signing_key(secret: &[u8], salt: &[u8]) -> Result<DerivedKey, AuthError> {
    derive_key(secret, salt, KeyUsage::Signature, MAX_DERIVED_KEY_LEN)
        .map_err(|e| AuthError::Issue(e.to_string()))
}

/// Issues and inspects bearer tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCodec;

impl TokenCodec {
    /// Issue a token for `subject` on `scope` of `cluster_uuid`.
    pub fn issue(
        secret: &[u8],
        salt: Option<&[u8]>,
        subject: &str,
        cluster_uuid: &str,
        scope: TokenScope,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        Self::issue_at(Utc::now(), secret, salt, subject, cluster_uuid, scope, expires_at)
    }

    /// [`issue`](Self::issue) with an explicit issue time.
    pub fn issue_at(
        now: DateTime<Utc>,
        secret: &[u8],
        salt: Option<&[u8]>,
        subject: &str,
        cluster_uuid: &str,
        scope: TokenScope,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            iss: issuer(cluster_uuid),
            sub: subject.to_string(),
            aud: Audience::Multiple(vec![scope.audience(cluster_uuid)]),
            nbf: Some(now.timestamp() - NOT_BEFORE_SKEW_SECS),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: salt.map(hex::encode),
        };

        let header = Header::new(TOKEN_ALGORITHM);
        let signed = match salt {
            Some(salt) => {
                let key = signing_key(secret, salt)?;
                encode(&header, &claims, &EncodingKey::from_secret(key.as_bytes()))
            }
            None => encode(&header, &claims, &EncodingKey::from_secret(secret)),
        };
        signed.map_err(|e| AuthError::Issue(e.to_string()))
    }

    /// Read claims without checking the signature, expiry or audience.
    ///
    /// Never an authentication decision on its own.
    pub fn inspect(token: &str) -> Result<UnverifiedClaims, AuthError> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<LooseClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|_| AuthError::Unauthenticated)?;
        let claims = data.claims;

        Ok(UnverifiedClaims {
            issuer: claims.iss,
            subject: claims.sub,
            audience: claims.aud.map(Audience::into_vec).unwrap_or_default(),
            id: claims.jti,
        })
    }
}
