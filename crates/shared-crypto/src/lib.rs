//! # Shared Crypto - Key Derivation Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `kdf` | HMAC-SHA256 | Purpose-scoped keys from one root secret |
//! | `compare` | `subtle` | Constant-time equality for tags and ETags |
//!
//! ## Security Properties
//!
//! - **Domain separation**: `SIGNATURE`, `INTEGRITY` and `ENCRYPTION` keys
//!   derived from the same secret and salt are independent
//! - **Zeroization**: Derived key material is wiped on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compare;
pub mod errors;
pub mod kdf;

// Re-exports
pub use compare::{constant_time_eq, constant_time_str_eq};
pub use errors::CryptoError;
pub use kdf::{derive_key, generate_salt, DerivedKey, KeyUsage, MAX_DERIVED_KEY_LEN, SALT_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
