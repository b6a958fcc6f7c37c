//! Core error types

use thiserror::Error;

/// Core error type for AuthCoin
#[derive(Debug, Error)]
pub enum CoreError {
    /// Label does not fit a fixed-width identifier
    #[error("Label '{label}' exceeds {max} bytes")]
    InvalidLabel { label: String, max: usize },

    /// Byte slice has the wrong width
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
