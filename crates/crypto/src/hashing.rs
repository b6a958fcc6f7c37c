//! Canonical record hashing.
//!
//! Every record digest is BLAKE3 over a domain tag followed by
//! length-prefixed fields, so no two field layouts can collide.

use authcoin_core::{ChallengeId, ContentType, Digest, EirId, SessionId};

pub const EIR_DOMAIN: &[u8] = b"authcoin.eir.v1";
pub const REVOCATION_DOMAIN: &[u8] = b"authcoin.revoke.v1";
pub const CHALLENGE_DOMAIN: &[u8] = b"authcoin.challenge.v1";
pub const RESPONSE_DOMAIN: &[u8] = b"authcoin.response.v1";
pub const SIGNATURE_RECORD_DOMAIN: &[u8] = b"authcoin.signature.v1";

/// Incremental builder for domain-separated digests.
pub struct CanonicalHasher {
    inner: blake3::Hasher,
}

impl CanonicalHasher {
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Self {
            inner: blake3::Hasher::new(),
        };
        hasher.field(domain);
        hasher
    }

    pub fn field(&mut self, bytes: &[u8]) -> &mut Self {
        self.inner.update(&(bytes.len() as u64).to_le_bytes());
        self.inner.update(bytes);
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.inner.update(&value.to_le_bytes());
        self
    }

    pub fn flag(&mut self, value: bool) -> &mut Self {
        self.inner.update(&[value as u8]);
        self
    }

    pub fn finalize(&self) -> Digest {
        Digest::from_bytes(*self.inner.finalize().as_bytes())
    }
}

/// Identity id: plain BLAKE3 of the identity content.
pub fn eir_id(content: &[u8]) -> EirId {
    EirId::from_bytes(*blake3::hash(content).as_bytes())
}

pub fn eir_digest(content: &[u8], content_type: &ContentType, identifiers: &[String]) -> Digest {
    let mut hasher = CanonicalHasher::new(EIR_DOMAIN);
    hasher.field(content).field(content_type.as_bytes());
    hasher.u64(identifiers.len() as u64);
    for identifier in identifiers {
        hasher.field(identifier.as_bytes());
    }
    hasher.finalize()
}

/// Message an identity signs with its own key to revoke itself.
pub fn revocation_digest(id: &EirId) -> Digest {
    CanonicalHasher::new(REVOCATION_DOMAIN)
        .field(id.as_bytes())
        .finalize()
}

pub fn challenge_digest(
    challenge_id: &ChallengeId,
    session_id: &SessionId,
    challenge_type: &str,
    payload: &[u8],
    verifier_eir: &EirId,
    target_eir: &EirId,
) -> Digest {
    CanonicalHasher::new(CHALLENGE_DOMAIN)
        .field(challenge_id.as_bytes())
        .field(session_id.as_bytes())
        .field(challenge_type.as_bytes())
        .field(payload)
        .field(verifier_eir.as_bytes())
        .field(target_eir.as_bytes())
        .finalize()
}

pub fn response_digest(session_id: &SessionId, challenge_id: &ChallengeId, content: &[u8]) -> Digest {
    CanonicalHasher::new(RESPONSE_DOMAIN)
        .field(session_id.as_bytes())
        .field(challenge_id.as_bytes())
        .field(content)
        .finalize()
}

pub fn signature_record_digest(
    session_id: &SessionId,
    challenge_id: &ChallengeId,
    value: u64,
    verdict: bool,
) -> Digest {
    CanonicalHasher::new(SIGNATURE_RECORD_DOMAIN)
        .field(session_id.as_bytes())
        .field(challenge_id.as_bytes())
        .u64(value)
        .flag(verdict)
        .finalize()
}

/// Compare a supplied hash against the expected digest.
pub fn digest_matches(expected: &Digest, supplied: &[u8]) -> bool {
    match <[u8; 32]>::try_from(supplied) {
        // blake3::Hash equality is constant time
        Ok(bytes) => blake3::Hash::from(bytes) == blake3::Hash::from(*expected.as_bytes()),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (SessionId, ChallengeId) {
        (
            SessionId::from_label("vae1").unwrap(),
            ChallengeId::from_label("challenge1").unwrap(),
        )
    }

    #[test]
    fn test_eir_id_is_content_hash() {
        assert_eq!(eir_id(b"content").as_bytes(), blake3::hash(b"content").as_bytes());
        assert_ne!(eir_id(b"content"), eir_id(b"content2"));
    }

    #[test]
    fn test_eir_digest_binds_identifiers() {
        let ct = ContentType::from_label("dummy").unwrap();
        let a = eir_digest(b"key", &ct, &["a@b.c".to_string()]);
        let b = eir_digest(b"key", &ct, &["a@b.cc".to_string()]);
        let c = eir_digest(b"key", &ct, &["a@b".to_string(), ".c".to_string()]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_challenge_digest_binds_direction() {
        let (session, challenge) = ids();
        let alice = eir_id(b"alice");
        let bob = eir_id(b"bob");
        let forward = challenge_digest(&challenge, &session, "sign", b"HELLO", &alice, &bob);
        let backward = challenge_digest(&challenge, &session, "sign", b"HELLO", &bob, &alice);
        assert_ne!(forward, backward);
    }

    #[test]
    fn test_domains_are_separated() {
        let (session, challenge) = ids();
        let response = response_digest(&session, &challenge, b"");
        let verdict = signature_record_digest(&session, &challenge, 0, false);
        assert_ne!(response, verdict);
    }

    #[test]
    fn test_signature_digest_binds_verdict() {
        let (session, challenge) = ids();
        assert_ne!(
            signature_record_digest(&session, &challenge, 1000, true),
            signature_record_digest(&session, &challenge, 1000, false)
        );
    }

    #[test]
    fn test_digest_matches() {
        let digest = revocation_digest(&eir_id(b"content"));
        assert!(digest_matches(&digest, digest.as_bytes()));
        assert!(!digest_matches(&digest, &[0u8; 32]));
        assert!(!digest_matches(&digest, &digest.as_bytes()[..31]));
        assert!(!digest_matches(&digest, b""));
    }
}
