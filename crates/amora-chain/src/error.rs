//! Chain-side error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid secret key")]
    InvalidSecretKey,

    #[error("missing attestation identity in env variable: '{var}'")]
    MissingIdentity { var: String },

    #[error("malformed memo")]
    MalformedMemo,

    #[error("signature verification failed")]
    BadSignature,

    #[error("transaction serialization failed: {0}")]
    Serialize(String),
}
