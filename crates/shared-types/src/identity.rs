//! # Identities
//!
//! Principals that can present a bearer token, and the cache they are
//! resolved from. The cache is owned by an external collaborator; the
//! guest channel only ever reads from it.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// How an identity authenticates. Forms the first half of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationMethod {
    /// Signed bearer token.
    Bearer,
    /// Client TLS certificate.
    Tls,
    /// External OIDC provider.
    Oidc,
}

impl fmt::Display for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bearer => "bearer",
            Self::Tls => "tls",
            Self::Oidc => "oidc",
        };
        f.write_str(s)
    }
}

/// Recorded type of an identity.
///
/// Bearer identities for the administrative API and for the guest channel
/// share a signing mechanism; the type is what keeps them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityType {
    /// Bearer identity for the administrative API.
    #[serde(rename = "Bearer")]
    Bearer,
    /// Bearer identity scoped to the guest channel.
    #[serde(rename = "DevLXD token bearer")]
    DevLxdBearer,
    /// Trusted client certificate.
    #[serde(rename = "Client certificate")]
    ClientCertificate,
    /// OIDC user.
    #[serde(rename = "OIDC client")]
    OidcClient,
}

impl IdentityType {
    /// Authentication method identities of this type use.
    pub fn authentication_method(&self) -> AuthenticationMethod {
        match self {
            Self::Bearer | Self::DevLxdBearer => AuthenticationMethod::Bearer,
            Self::ClientCertificate => AuthenticationMethod::Tls,
            Self::OidcClient => AuthenticationMethod::Oidc,
        }
    }
}

/// A principal resolvable by subject.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier; used as token subject and as device owner.
    pub identifier: String,
    /// Recorded identity type.
    pub identity_type: IdentityType,
    /// Root secret for token signing. Never serialized to clients.
    #[serde(skip_serializing, default)]
    pub secret: Vec<u8>,
}

impl Identity {
    /// Create an identity.
    pub fn new(
        identifier: impl Into<String>,
        identity_type: IdentityType,
        secret: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            identity_type,
            secret: secret.into(),
        }
    }
}

// Keep the secret out of logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("identifier", &self.identifier)
            .field("identity_type", &self.identity_type)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Read-only view over the identity cache.
///
/// Implementations must be safe for concurrent lookups.
pub trait IdentityCache: Send + Sync {
    /// Look up an identity by authentication method and subject.
    fn get(&self, method: AuthenticationMethod, subject: &str) -> Option<Identity>;
}

/// Process-local identity cache.
///
/// Suitable for a single daemon; the cluster-wide cache replaces it in
/// deployments that replicate identities.
#[derive(Debug, Default)]
pub struct InMemoryIdentityCache {
    entries: RwLock<HashMap<(AuthenticationMethod, String), Identity>>,
}

impl InMemoryIdentityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an identity, keyed by its own method and identifier.
    pub fn insert(&self, identity: Identity) {
        let key = (
            identity.identity_type.authentication_method(),
            identity.identifier.clone(),
        );
        self.entries.write().insert(key, identity);
    }

    /// Remove an identity. Returns the removed entry, if any.
    pub fn remove(&self, method: AuthenticationMethod, subject: &str) -> Option<Identity> {
        self.entries.write().remove(&(method, subject.to_string()))
    }

    /// Number of cached identities.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache holds no identities.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl IdentityCache for InMemoryIdentityCache {
    fn get(&self, method: AuthenticationMethod, subject: &str) -> Option<Identity> {
        self.entries
            .read()
            .get(&(method, subject.to_string()))
            .cloned()
    }
}
