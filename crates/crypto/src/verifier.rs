//! Pluggable signature verifiers.
//!
//! A verifier answers one question: did the holder of the key in `content`
//! sign `hash`? The registry resolves verifiers through a content-type
//! lookup table, so new schemes plug in without touching record logic.

use crate::error::CryptoError;
use ed25519_dalek::Verifier as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Stateless signature verification capability.
pub trait SignatureVerifier: Send + Sync + fmt::Debug {
    /// Scheme name used in logs and configuration.
    fn scheme(&self) -> &'static str;

    /// Returns true when `signature` over `hash` was produced by the key
    /// encoded in `content`. Must be pure and must never panic.
    fn verify(&self, content: &[u8], hash: &[u8], signature: &[u8]) -> bool;
}

/// Shared verifier reference stored in the registry lookup table.
pub type SharedVerifier = Arc<dyn SignatureVerifier>;

/// Ed25519 over the raw digest. Content is the 32-byte public key.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn scheme(&self) -> &'static str {
        "ed25519"
    }

    fn verify(&self, content: &[u8], hash: &[u8], signature: &[u8]) -> bool {
        let key_bytes: [u8; 32] = match content.try_into() {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let verifying_key = match ed25519_dalek::VerifyingKey::from_bytes(&key_bytes) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let signature_bytes: [u8; 64] = match signature.try_into() {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let signature = ed25519_dalek::Signature::from_bytes(&signature_bytes);
        verifying_key.verify(hash, &signature).is_ok()
    }
}

/// ECDSA P-256. Content is a SEC1 public key, compressed or not.
/// Signatures may be 64-byte fixed encoding or DER.
#[derive(Debug, Default, Clone, Copy)]
pub struct P256Verifier;

impl SignatureVerifier for P256Verifier {
    fn scheme(&self) -> &'static str {
        "p256"
    }

    fn verify(&self, content: &[u8], hash: &[u8], signature: &[u8]) -> bool {
        use p256::ecdsa::signature::Verifier as _;

        let verifying_key = match p256::ecdsa::VerifyingKey::from_sec1_bytes(content) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let parsed = if signature.len() == 64 {
            p256::ecdsa::Signature::from_slice(signature)
        } else {
            p256::ecdsa::Signature::from_der(signature)
        };
        let signature = match parsed {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        verifying_key.verify(hash, &signature).is_ok()
    }
}

/// ECDSA secp256k1 over the raw digest, in the style of `ecrecover`.
///
/// Content is a SEC1 public key. A 65-byte `r || s || v` signature is
/// checked by recovering the signer's key and comparing it with the
/// content; `v` may be 0/1 or 27/28. A 64-byte `r || s` signature is
/// verified directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1Verifier;

impl SignatureVerifier for Secp256k1Verifier {
    fn scheme(&self) -> &'static str {
        "secp256k1"
    }

    fn verify(&self, content: &[u8], hash: &[u8], signature: &[u8]) -> bool {
        use k256::ecdsa::signature::hazmat::PrehashVerifier as _;
        use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

        let verifying_key = match VerifyingKey::from_sec1_bytes(content) {
            Ok(key) => key,
            Err(_) => return false,
        };

        match signature.len() {
            64 => match Signature::from_slice(signature) {
                Ok(sig) => verifying_key.verify_prehash(hash, &sig).is_ok(),
                Err(_) => false,
            },
            65 => {
                let sig = match Signature::from_slice(&signature[..64]) {
                    Ok(sig) => sig,
                    Err(_) => return false,
                };
                let v = signature[64];
                let recovery_id = match RecoveryId::from_byte(if v >= 27 { v - 27 } else { v }) {
                    Some(id) => id,
                    None => return false,
                };
                VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
                    .map(|recovered| recovered == verifying_key)
                    .unwrap_or(false)
            }
            _ => false,
        }
    }
}

/// RSA PKCS#1 v1.5 over the raw digest (no DigestInfo prefix).
///
/// Content is a PKCS#1 or SPKI DER public key, or a bare big-endian modulus
/// with public exponent 65537.
#[derive(Debug, Default, Clone, Copy)]
pub struct RsaVerifier;

/// Public exponent assumed for bare-modulus content.
const RSA_DEFAULT_EXPONENT: [u8; 3] = [0x01, 0x00, 0x01];

fn rsa_public_key(content: &[u8]) -> Option<rsa::RsaPublicKey> {
    use rsa::pkcs1::DecodeRsaPublicKey as _;
    use rsa::pkcs8::DecodePublicKey as _;

    if content.is_empty() {
        return None;
    }
    rsa::RsaPublicKey::from_pkcs1_der(content)
        .ok()
        .or_else(|| rsa::RsaPublicKey::from_public_key_der(content).ok())
        .or_else(|| {
            rsa::RsaPublicKey::new(
                rsa::BigUint::from_bytes_be(content),
                rsa::BigUint::from_bytes_be(&RSA_DEFAULT_EXPONENT),
            )
            .ok()
        })
}

impl SignatureVerifier for RsaVerifier {
    fn scheme(&self) -> &'static str {
        "rsa"
    }

    fn verify(&self, content: &[u8], hash: &[u8], signature: &[u8]) -> bool {
        match rsa_public_key(content) {
            Some(key) => key
                .verify(rsa::Pkcs1v15Sign::new_unprefixed(), hash, signature)
                .is_ok(),
            None => false,
        }
    }
}

/// Deterministic verifier for tests and development networks.
///
/// An accepting dummy passes every non-empty signature; a rejecting dummy
/// fails everything.
#[derive(Debug, Clone, Copy)]
pub struct DummyVerifier {
    accept: bool,
}

impl DummyVerifier {
    pub fn accepting() -> Self {
        Self { accept: true }
    }

    pub fn rejecting() -> Self {
        Self { accept: false }
    }
}

impl Default for DummyVerifier {
    fn default() -> Self {
        Self::accepting()
    }
}

impl SignatureVerifier for DummyVerifier {
    fn scheme(&self) -> &'static str {
        if self.accept {
            "dummy"
        } else {
            "dummy-reject"
        }
    }

    fn verify(&self, _content: &[u8], _hash: &[u8], signature: &[u8]) -> bool {
        self.accept && !signature.is_empty()
    }
}

/// Built-in verifier implementations, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerifierKind {
    Ed25519,
    P256,
    Secp256k1,
    Rsa,
    Dummy,
    DummyReject,
}

impl VerifierKind {
    pub fn name(&self) -> &'static str {
        match self {
            VerifierKind::Ed25519 => "ed25519",
            VerifierKind::P256 => "p256",
            VerifierKind::Secp256k1 => "secp256k1",
            VerifierKind::Rsa => "rsa",
            VerifierKind::Dummy => "dummy",
            VerifierKind::DummyReject => "dummy-reject",
        }
    }

    /// Instantiate a shared verifier for this kind.
    pub fn build(&self) -> SharedVerifier {
        match self {
            VerifierKind::Ed25519 => Arc::new(Ed25519Verifier),
            VerifierKind::P256 => Arc::new(P256Verifier),
            VerifierKind::Secp256k1 => Arc::new(Secp256k1Verifier),
            VerifierKind::Rsa => Arc::new(RsaVerifier),
            VerifierKind::Dummy => Arc::new(DummyVerifier::accepting()),
            VerifierKind::DummyReject => Arc::new(DummyVerifier::rejecting()),
        }
    }
}

impl FromStr for VerifierKind {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(VerifierKind::Ed25519),
            "p256" | "ecdsa-p256" | "ec" => Ok(VerifierKind::P256),
            "secp256k1" | "k256" | "ecdsa-secp256k1" => Ok(VerifierKind::Secp256k1),
            "rsa" | "rsa-pkcs1" => Ok(VerifierKind::Rsa),
            "dummy" => Ok(VerifierKind::Dummy),
            "dummy-reject" => Ok(VerifierKind::DummyReject),
            other => Err(CryptoError::UnknownScheme(other.to_string())),
        }
    }
}

impl fmt::Display for VerifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
