//! # Token Claims
//!
//! Tokens carry `iss = "lxd:<cluster>"` and a single-element audience
//! `"<scope>:<cluster>"`. The scope tag is what separates guest tokens from
//! administrative ones.

use serde::{Deserialize, Serialize};
use shared_types::IdentityType;
use std::fmt;

/// Prefix of every issuer and of the administrative audience.
pub const ISSUER_PREFIX: &str = "lxd";

/// API surface a token is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    /// Administrative API.
    Lxd,
    /// Guest channel.
    DevLxd,
}

impl TokenScope {
    /// Audience tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Lxd => "lxd",
            Self::DevLxd => "devlxd",
        }
    }

    /// Audience value for `cluster_uuid`.
    pub fn audience(&self, cluster_uuid: &str) -> String {
        format!("{}:{}", self.tag(), cluster_uuid)
    }

    /// Identity type that may authenticate on this surface.
    pub fn identity_type(&self) -> IdentityType {
        match self {
            Self::Lxd => IdentityType::Bearer,
            Self::DevLxd => IdentityType::DevLxdBearer,
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Issuer value for `cluster_uuid`.
pub fn issuer(cluster_uuid: &str) -> String {
    format!("{ISSUER_PREFIX}:{cluster_uuid}")
}

/// `aud` may be encoded as a single string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Bare string form.
    Single(String),
    /// Array form. Issued tokens always use this.
    Multiple(Vec<String>),
}

impl Audience {
    /// Audience values as a list.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s],
            Self::Multiple(v) => v,
        }
    }
}

/// Verified claim set.
///
/// `iat` and `exp` are required: a token without them fails to decode.
/// `nbf` is optional and checked only when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer
    pub iss: String,
    /// Subject (identity identifier)
    pub sub: String,
    /// Audience
    pub aud: Audience,
    /// Not before, unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
    /// Hex-encoded key-derivation salt, present on derived-key tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Claims read without verifying the signature.
///
/// Only good for deciding whether a bearer string is worth verifying.
/// Nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnverifiedClaims {
    /// `iss`, if present
    pub issuer: Option<String>,
    /// `sub`, if present
    pub subject: Option<String>,
    /// `aud` as a list, empty if absent
    pub audience: Vec<String>,
    /// `jti`, if present
    pub id: Option<String>,
}
