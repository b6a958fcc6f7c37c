//! Cryptographic error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Unknown signature scheme: {0}")]
    UnknownScheme(String),

    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },

    #[error("Signing failed: {reason}")]
    SigningFailed { reason: String },
}
