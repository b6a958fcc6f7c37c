//! Error types for registry operations.
//!
//! Every failing call is all-or-nothing: when one of these is returned the
//! registry state is exactly what it was before the call.

use authcoin_core::{AccountId, CoreError, EirId};
use std::fmt;
use thiserror::Error;

/// What kind of entity a reference or duplicate error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Eir,
    Verifier,
    Session,
    Challenge,
    Response,
    Signature,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Eir => "identity record",
            ReferenceKind::Verifier => "signature verifier",
            ReferenceKind::Session => "session",
            ReferenceKind::Challenge => "challenge",
            ReferenceKind::Response => "challenge response",
            ReferenceKind::Signature => "challenge signature",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Non-owner attempted an owner-only operation
    #[error("Access denied: {caller} is not the registry owner")]
    AccessDenied { caller: AccountId },

    /// Hash mismatch, invalid signature or unknown content type
    #[error("Verification failed: {0}")]
    VerificationError(String),

    /// Referenced entity does not exist
    #[error("Unknown {kind}: {id}")]
    UnknownReference { kind: ReferenceKind, id: String },

    /// Entity or record already registered
    #[error("Duplicate {kind}: {id}")]
    DuplicateError { kind: ReferenceKind, id: String },

    /// Session structure rule broken
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Participant identity has been revoked
    #[error("Identity {id} is revoked")]
    RevokedIdentity { id: EirId },

    /// Malformed argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RegistryError {
    pub(crate) fn unknown(kind: ReferenceKind, id: impl fmt::Display) -> Self {
        RegistryError::UnknownReference {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: ReferenceKind, id: impl fmt::Display) -> Self {
        RegistryError::DuplicateError {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<CoreError> for RegistryError {
    fn from(err: CoreError) -> Self {
        RegistryError::InvalidInput(err.to_string())
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
