//! Fixed-width identifiers shared across the AuthCoin workspace.
//!
//! Content types, identity ids, session ids and challenge ids are all
//! 32-byte values. Human-readable labels are right-padded with zero bytes,
//! matching how the host ledger encodes `bytes32` arguments.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of every identifier in bytes.
pub const ID_LEN: usize = 32;

macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub [u8; ID_LEN]);

        impl $name {
            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
                Self(bytes)
            }

            /// Build from a label, right-padding with zero bytes.
            pub fn from_label(label: &str) -> Result<Self, CoreError> {
                pad_label(label.as_bytes()).map(Self)
            }

            /// Build from a slice that must be exactly [`ID_LEN`] bytes.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
                let array: [u8; ID_LEN] =
                    bytes.try_into().map_err(|_| CoreError::InvalidLength {
                        expected: ID_LEN,
                        actual: bytes.len(),
                    })?;
                Ok(Self(array))
            }

            pub fn as_bytes(&self) -> &[u8; ID_LEN] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Printable label with trailing padding removed.
            pub fn label(&self) -> String {
                trimmed_label(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

fixed_id!(
    /// Tag selecting the signature scheme that governs a record.
    ContentType
);

fixed_id!(
    /// Identity record id, the BLAKE3 hash of the identity content.
    EirId
);

fixed_id!(
    /// Authentication session id shared by every record of one handshake.
    SessionId
);

fixed_id!(
    /// Identifier of one challenge within a session.
    ChallengeId
);

fixed_id!(
    /// 32-byte digest produced by the canonical record hashing.
    Digest
);

/// Caller identity supplied by the host ledger with every transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn pad_label(label: &[u8]) -> Result<[u8; ID_LEN], CoreError> {
    if label.len() > ID_LEN {
        return Err(CoreError::InvalidLabel {
            label: String::from_utf8_lossy(label).into_owned(),
            max: ID_LEN,
        });
    }
    let mut bytes = [0u8; ID_LEN];
    bytes[..label.len()].copy_from_slice(label);
    Ok(bytes)
}

fn trimmed_label(bytes: &[u8; ID_LEN]) -> String {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
