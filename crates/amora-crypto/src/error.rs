//! Crypto error types.

use thiserror::Error;

/// Errors from sealing, opening, and envelope framing.
///
/// Variants carry no plaintext and no key material; display strings are safe
/// to log as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("malformed envelope")]
    MalformedEnvelope,

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid identifier")]
    InvalidIdentifier,
}
