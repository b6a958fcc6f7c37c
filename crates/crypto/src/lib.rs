//! Cryptographic primitives for the AuthCoin registry.
//!
//! # Core Capabilities
//!
//! - **Canonical hashing**: domain-separated BLAKE3 digests for every record
//! - **Signature verification**: the `SignatureVerifier` plugin contract with
//!   Ed25519, ECDSA P-256, ECDSA secp256k1, RSA and dummy implementations
//! - **Signing**: key pairs that produce signatures the verifiers accept
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - Verifiers are pure and never panic on malformed input
//! - Secrets must never be logged

pub mod error;
pub mod hashing;
pub mod signing;
pub mod verifier;

pub use error::CryptoError;
pub use hashing::{
    challenge_digest, digest_matches, eir_digest, eir_id, response_digest, revocation_digest,
    signature_record_digest, CanonicalHasher,
};
pub use signing::{Ed25519Signer, P256Signer, RsaSigner, Secp256k1Signer};
pub use verifier::{
    DummyVerifier, Ed25519Verifier, P256Verifier, RsaVerifier, Secp256k1Verifier,
    SharedVerifier, SignatureVerifier, VerifierKind,
};
