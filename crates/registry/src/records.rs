//! Verified registry records.
//!
//! A record can only be built through `verify_new`, which recomputes the
//! canonical digest from the request fields, compares it to the claimed
//! hash and checks the signature with the signer's identity content.

use crate::error::{RegistryError, RegistryResult};
use crate::requests::{ChallengeRequest, EirRequest, ResponseRequest, SignatureRecordRequest};
use authcoin_core::{ChallengeId, ContentType, Digest, EirId, SessionId};
use authcoin_crypto::{digest_matches, eir_id, revocation_digest, SignatureVerifier};
use serde::{Deserialize, Serialize};

fn check_signed(
    what: &str,
    expected: &Digest,
    claimed_hash: &[u8],
    signer_content: &[u8],
    signature: &[u8],
    scheme: &dyn SignatureVerifier,
) -> RegistryResult<()> {
    if !digest_matches(expected, claimed_hash) {
        return Err(RegistryError::VerificationError(format!(
            "{what} hash does not match its fields"
        )));
    }
    if !scheme.verify(signer_content, expected.as_bytes(), signature) {
        return Err(RegistryError::VerificationError(format!(
            "{what} signature rejected by {} verifier",
            scheme.scheme()
        )));
    }
    Ok(())
}

/// Entity Identity Record: a self-signed public identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIdentityRecord {
    id: EirId,
    content: Vec<u8>,
    content_type: ContentType,
    identifiers: Vec<String>,
    hash: Digest,
    signature: Vec<u8>,
    revoked: bool,
}

impl EntityIdentityRecord {
    /// Verify a self-signed registration request.
    pub fn verify_new(request: EirRequest, scheme: &dyn SignatureVerifier) -> RegistryResult<Self> {
        if request.content.is_empty() {
            return Err(RegistryError::InvalidInput(
                "identity content must not be empty".to_string(),
            ));
        }

        let expected = request.digest();
        check_signed(
            "identity",
            &expected,
            &request.hash,
            &request.content,
            &request.signature,
            scheme,
        )?;

        Ok(Self {
            id: eir_id(&request.content),
            content: request.content,
            content_type: request.content_type,
            identifiers: request.identifiers,
            hash: expected,
            signature: request.signature,
            revoked: false,
        })
    }

    pub fn id(&self) -> &EirId {
        &self.id
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn identifier(&self, index: usize) -> Option<&str> {
        self.identifiers.get(index).map(String::as_str)
    }

    pub fn identifiers_count(&self) -> usize {
        self.identifiers.len()
    }

    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Check a revocation signature made with this identity's own key.
    pub fn accepts_revocation(&self, signature: &[u8], scheme: &dyn SignatureVerifier) -> bool {
        let digest = revocation_digest(&self.id);
        scheme.verify(&self.content, digest.as_bytes(), signature)
    }

    pub(crate) fn mark_revoked(&mut self) {
        self.revoked = true;
    }
}

/// A challenge issued by the verifier identity to the target identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    challenge_id: ChallengeId,
    session_id: SessionId,
    challenge_type: String,
    payload: Vec<u8>,
    verifier_eir: EirId,
    target_eir: EirId,
    hash: Digest,
    signature: Vec<u8>,
}

impl ChallengeRecord {
    /// Verify a challenge signed by `verifier`, the identity issuing it.
    pub fn verify_new(
        request: ChallengeRequest,
        verifier: &EntityIdentityRecord,
        scheme: &dyn SignatureVerifier,
    ) -> RegistryResult<Self> {
        if verifier.id() != &request.verifier_eir {
            return Err(RegistryError::InvalidInput(format!(
                "challenge names verifier {} but was checked against {}",
                request.verifier_eir,
                verifier.id()
            )));
        }

        let expected = request.digest();
        check_signed(
            "challenge",
            &expected,
            &request.hash,
            verifier.content(),
            &request.signature,
            scheme,
        )?;

        Ok(Self {
            challenge_id: request.challenge_id,
            session_id: request.session_id,
            challenge_type: request.challenge_type,
            payload: request.payload,
            verifier_eir: request.verifier_eir,
            target_eir: request.target_eir,
            hash: expected,
            signature: request.signature,
        })
    }

    pub fn challenge_id(&self) -> &ChallengeId {
        &self.challenge_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn challenge_type(&self) -> &str {
        &self.challenge_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn verifier_eir(&self) -> &EirId {
        &self.verifier_eir
    }

    pub fn target_eir(&self) -> &EirId {
        &self.target_eir
    }

    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// The target's answer to one challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponseRecord {
    session_id: SessionId,
    challenge_id: ChallengeId,
    content: Vec<u8>,
    hash: Digest,
    signature: Vec<u8>,
}

impl ChallengeResponseRecord {
    /// Verify a response signed by `target`, the challenged identity.
    pub fn verify_new(
        request: ResponseRequest,
        target: &EntityIdentityRecord,
        scheme: &dyn SignatureVerifier,
    ) -> RegistryResult<Self> {
        let expected = request.digest();
        check_signed(
            "response",
            &expected,
            &request.hash,
            target.content(),
            &request.signature,
            scheme,
        )?;

        Ok(Self {
            session_id: request.session_id,
            challenge_id: request.challenge_id,
            content: request.content,
            hash: expected,
            signature: request.signature,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn challenge_id(&self) -> &ChallengeId {
        &self.challenge_id
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// The verifier's signed verdict on a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeSignatureRecord {
    session_id: SessionId,
    challenge_id: ChallengeId,
    value: u64,
    verdict: bool,
    hash: Digest,
    signature: Vec<u8>,
}

impl ChallengeSignatureRecord {
    /// Verify a verdict signed by `verifier`, the identity that issued the challenge.
    pub fn verify_new(
        request: SignatureRecordRequest,
        verifier: &EntityIdentityRecord,
        scheme: &dyn SignatureVerifier,
    ) -> RegistryResult<Self> {
        let expected = request.digest();
        check_signed(
            "signature record",
            &expected,
            &request.hash,
            verifier.content(),
            &request.signature,
            scheme,
        )?;

        Ok(Self {
            session_id: request.session_id,
            challenge_id: request.challenge_id,
            value: request.value,
            verdict: request.verdict,
            hash: expected,
            signature: request.signature,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn challenge_id(&self) -> &ChallengeId {
        &self.challenge_id
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn verdict(&self) -> bool {
        self.verdict
    }

    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authcoin_crypto::{DummyVerifier, Ed25519Signer, Ed25519Verifier};

    fn ed25519_type() -> ContentType {
        ContentType::from_label("ed25519").unwrap()
    }

    fn register(signer: &Ed25519Signer, identifiers: &[&str]) -> EntityIdentityRecord {
        let request = EirRequest::new(
            signer.public_content(),
            ed25519_type(),
            identifiers.iter().map(|s| s.to_string()).collect(),
        )
        .sign_with(|d| signer.sign_digest(d));
        EntityIdentityRecord::verify_new(request, &Ed25519Verifier).unwrap()
    }

    #[test]
    fn test_eir_fields_and_id() {
        let signer = Ed25519Signer::from_seed([1u8; 32]);
        let eir = register(&signer, &["alice@example.com", "alice"]);

        assert_eq!(eir.id(), &eir_id(&signer.public_content()));
        assert_eq!(eir.identifiers_count(), 2);
        assert_eq!(eir.identifier(1), Some("alice"));
        assert_eq!(eir.identifier(2), None);
        assert!(!eir.is_revoked());
    }

    #[test]
    fn test_eir_rejects_tampered_identifiers() {
        let signer = Ed25519Signer::from_seed([1u8; 32]);
        let mut request = EirRequest::new(signer.public_content(), ed25519_type(), vec!["a".into()])
            .sign_with(|d| signer.sign_digest(d));
        request.identifiers.push("b".into());

        let err = EntityIdentityRecord::verify_new(request, &Ed25519Verifier).unwrap_err();
        assert!(matches!(err, RegistryError::VerificationError(_)));
    }

    #[test]
    fn test_eir_rejects_foreign_signature() {
        let owner = Ed25519Signer::from_seed([1u8; 32]);
        let other = Ed25519Signer::from_seed([2u8; 32]);
        let request = EirRequest::new(owner.public_content(), ed25519_type(), vec![])
            .sign_with(|d| other.sign_digest(d));

        let err = EntityIdentityRecord::verify_new(request, &Ed25519Verifier).unwrap_err();
        assert!(matches!(err, RegistryError::VerificationError(_)));
    }

    #[test]
    fn test_eir_rejects_empty_content() {
        let request = EirRequest::new(Vec::new(), ed25519_type(), vec![]).sign_with(|_| vec![1]);
        let err = EntityIdentityRecord::verify_new(request, &DummyVerifier::accepting()).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }

    #[test]
    fn test_revocation_signature_check() {
        let signer = Ed25519Signer::from_seed([3u8; 32]);
        let other = Ed25519Signer::from_seed([4u8; 32]);
        let eir = register(&signer, &[]);

        let good = signer.sign_digest(&revocation_digest(eir.id()));
        let bad = other.sign_digest(&revocation_digest(eir.id()));
        assert!(eir.accepts_revocation(&good, &Ed25519Verifier));
        assert!(!eir.accepts_revocation(&bad, &Ed25519Verifier));
    }

    #[test]
    fn test_challenge_checked_against_verifier_identity() {
        let verifier = Ed25519Signer::from_seed([5u8; 32]);
        let target = Ed25519Signer::from_seed([6u8; 32]);
        let verifier_eir = register(&verifier, &["v"]);
        let target_eir = register(&target, &["t"]);

        let unsigned = ChallengeRequest::new(
            ChallengeId::from_label("c1").unwrap(),
            SessionId::from_label("s1").unwrap(),
            "sign-content",
            b"nonce".to_vec(),
            *verifier_eir.id(),
            *target_eir.id(),
        );

        let by_target = unsigned.clone().sign_with(|d| target.sign_digest(d));
        assert!(ChallengeRecord::verify_new(by_target, &verifier_eir, &Ed25519Verifier).is_err());

        let wrong_identity = unsigned.clone().sign_with(|d| verifier.sign_digest(d));
        let err = ChallengeRecord::verify_new(wrong_identity, &target_eir, &Ed25519Verifier).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput(_)));

        let signed = unsigned.sign_with(|d| verifier.sign_digest(d));
        let record = ChallengeRecord::verify_new(signed, &verifier_eir, &Ed25519Verifier).unwrap();
        assert_eq!(record.challenge_type(), "sign-content");
        assert_eq!(record.target_eir(), target_eir.id());
    }

    #[test]
    fn test_signature_record_binds_verdict() {
        let verifier = Ed25519Signer::from_seed([7u8; 32]);
        let verifier_eir = register(&verifier, &[]);

        let mut request = SignatureRecordRequest::new(
            SessionId::from_label("s1").unwrap(),
            ChallengeId::from_label("c1").unwrap(),
            10,
            true,
        )
        .sign_with(|d| verifier.sign_digest(d));
        request.verdict = false;

        let err = ChallengeSignatureRecord::verify_new(request, &verifier_eir, &Ed25519Verifier)
            .unwrap_err();
        assert!(matches!(err, RegistryError::VerificationError(_)));
    }
}
