//! # Key Derivation
//!
//! Derives purpose-scoped keys from one root secret:
//!
//! ```text
//! key = HMAC-SHA256(secret, salt || usage_tag)[..length]
//! ```
//!
//! The usage tag gives domain separation, so a signing key can never be
//! reused as an encryption key. Tag strings and the concatenation order are
//! part of the wire contract: tokens and cookies issued earlier must still
//! verify.

use crate::CryptoError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Output size of the keyed hash; the longest key that can be derived.
pub const MAX_DERIVED_KEY_LEN: usize = 32;

/// Length of salts produced by [`generate_salt`].
pub const SALT_LEN: usize = 32;

/// Purpose a derived key is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyUsage {
    /// Token and cookie signatures.
    Signature,
    /// Integrity tags over stored data.
    Integrity,
    /// Symmetric encryption.
    Encryption,
}

impl KeyUsage {
    /// Tag mixed into the derivation input.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Signature => "SIGNATURE",
            Self::Integrity => "INTEGRITY",
            Self::Encryption => "ENCRYPTION",
        }
    }
}

/// Key material derived for a single purpose. Zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey(Vec<u8>);

impl DerivedKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a zero-length key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey({} bytes)", self.0.len())
    }
}

/// Derive a `length`-byte key for `usage` from `secret` and `salt`.
///
/// # Errors
///
/// Returns `CryptoError::KeyTooLong` if `length` exceeds
/// [`MAX_DERIVED_KEY_LEN`], and `CryptoError::InvalidInput` for a
/// zero-length request.
pub fn derive_key(
    secret: &[u8],
    salt: &[u8],
    usage: KeyUsage,
    length: usize,
) -> Result<DerivedKey, CryptoError> {
    if length > MAX_DERIVED_KEY_LEN {
        return Err(CryptoError::KeyTooLong {
            requested: length,
            max: MAX_DERIVED_KEY_LEN,
        });
    }
    if length == 0 {
        return Err(CryptoError::InvalidInput(
            "derived key length must be non-zero".into(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
    mac.update(salt);
    mac.update(usage.tag().as_bytes());

    let mut output = mac.finalize().into_bytes();
    let key = output[..length].to_vec();
    output.as_mut_slice().zeroize();

    Ok(DerivedKey(key))
}

/// Generate a random salt of [`SALT_LEN`] bytes.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut salt);
    salt
}
