//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Requested key is longer than the keyed-hash output
    #[error("Requested key length {requested} exceeds maximum {max}")]
    KeyTooLong {
        /// Requested key length in bytes
        requested: usize,
        /// Keyed-hash output size in bytes
        max: usize,
    },

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Invalid input for cryptographic operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
