//! Client-side signers producing signatures the built-in verifiers accept.
//!
//! Ed25519 and P-256 signing cannot fail once a key is loaded; secp256k1 and
//! RSA signing return a `Result`.
//!
//! Participants use these to sign record digests before submitting them to
//! the registry. Private keys never leave the signer.

use crate::error::CryptoError;
use authcoin_core::Digest;
use ed25519_dalek::Signer as _;
use zeroize::Zeroize;

/// Ed25519 key pair. Public content is the 32-byte verifying key.
pub struct Ed25519Signer {
    signing_key: ed25519_dalek::SigningKey,
}

impl Ed25519Signer {
    /// Generate a fresh key from the thread RNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        let signer = Self::from_seed(secret);
        secret.zeroize();
        signer
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&seed),
        }
    }

    /// Load from secret key bytes. The temporary copy is zeroized.
    pub fn from_key(key_bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut key_array: [u8; 32] =
            key_bytes.try_into().map_err(|_| CryptoError::InvalidKey {
                reason: format!("Invalid key length: {} (expected 32)", key_bytes.len()),
            })?;
        let signer = Self::from_seed(key_array);
        key_array.zeroize();
        Ok(signer)
    }

    pub fn public_content(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    pub fn sign_digest(&self, digest: &Digest) -> Vec<u8> {
        self.signing_key.sign(digest.as_bytes()).to_bytes().to_vec()
    }
}

/// ECDSA P-256 key pair. Public content is the compressed SEC1 point.
pub struct P256Signer {
    signing_key: p256::ecdsa::SigningKey,
}

impl P256Signer {
    pub fn generate() -> Self {
        Self {
            signing_key: p256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Scalar must be non-zero and below the curve order.
    pub fn from_seed(seed: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            p256::ecdsa::SigningKey::from_slice(&seed).map_err(|e| CryptoError::InvalidKey {
                reason: e.to_string(),
            })?;
        Ok(Self { signing_key })
    }

    pub fn public_content(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    /// Fixed 64-byte `r || s` encoding.
    pub fn sign_digest(&self, digest: &Digest) -> Vec<u8> {
        use p256::ecdsa::signature::Signer as _;
        let signature: p256::ecdsa::Signature = self.signing_key.sign(digest.as_bytes());
        signature.to_bytes().to_vec()
    }

    pub fn sign_digest_der(&self, digest: &Digest) -> Vec<u8> {
        use p256::ecdsa::signature::Signer as _;
        let signature: p256::ecdsa::Signature = self.signing_key.sign(digest.as_bytes());
        signature.to_der().as_bytes().to_vec()
    }
}

/// ECDSA secp256k1 key pair. Public content is the compressed SEC1 point.
pub struct Secp256k1Signer {
    signing_key: k256::ecdsa::SigningKey,
}

impl Secp256k1Signer {
    pub fn generate() -> Self {
        Self {
            signing_key: k256::ecdsa::SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Scalar must be non-zero and below the curve order.
    pub fn from_seed(seed: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            k256::ecdsa::SigningKey::from_slice(&seed).map_err(|e| CryptoError::InvalidKey {
                reason: e.to_string(),
            })?;
        Ok(Self { signing_key })
    }

    pub fn public_content(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    /// Recoverable 65-byte `r || s || v` signature over the digest.
    pub fn sign_digest(&self, digest: &Digest) -> Result<Vec<u8>, CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| CryptoError::SigningFailed {
                reason: e.to_string(),
            })?;
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte());
        Ok(bytes)
    }

    /// Fixed 64-byte `r || s` signature over the digest.
    pub fn sign_digest_compact(&self, digest: &Digest) -> Result<Vec<u8>, CryptoError> {
        use k256::ecdsa::signature::hazmat::PrehashSigner as _;
        let signature: k256::ecdsa::Signature = self
            .signing_key
            .sign_prehash(digest.as_bytes())
            .map_err(|e| CryptoError::SigningFailed {
                reason: e.to_string(),
            })?;
        Ok(signature.to_bytes().to_vec())
    }
}

/// RSA key pair with public exponent 65537. Public content is the bare
/// big-endian modulus.
pub struct RsaSigner {
    private_key: rsa::RsaPrivateKey,
}

impl RsaSigner {
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let private_key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), bits).map_err(|e| {
            CryptoError::InvalidKey {
                reason: e.to_string(),
            }
        })?;
        Ok(Self { private_key })
    }

    /// Deterministic key generation from a seeded RNG.
    pub fn from_seed(seed: [u8; 32], bits: usize) -> Result<Self, CryptoError> {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::from_seed(seed);
        let private_key =
            rsa::RsaPrivateKey::new(&mut rng, bits).map_err(|e| CryptoError::InvalidKey {
                reason: e.to_string(),
            })?;
        Ok(Self { private_key })
    }

    pub fn public_content(&self) -> Vec<u8> {
        use rsa::traits::PublicKeyParts as _;
        self.private_key.n().to_bytes_be()
    }

    /// PKCS#1 DER encoding of the public key.
    pub fn public_key_der(&self) -> Result<Vec<u8>, CryptoError> {
        use rsa::pkcs1::EncodeRsaPublicKey as _;
        self.private_key
            .to_public_key()
            .to_pkcs1_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CryptoError::InvalidKey {
                reason: e.to_string(),
            })
    }

    /// PKCS#1 v1.5 signature over the raw digest.
    pub fn sign_digest(&self, digest: &Digest) -> Result<Vec<u8>, CryptoError> {
        self.private_key
            .sign(rsa::Pkcs1v15Sign::new_unprefixed(), digest.as_bytes())
            .map_err(|e| CryptoError::SigningFailed {
                reason: e.to_string(),
            })
    }
}
