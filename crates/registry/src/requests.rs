//! Client-supplied arguments for the registration calls.
//!
//! A request carries the claimed hash and signature. Clients fill both with
//! `sign_with`, which computes the canonical digest of the request fields
//! and hands it to whatever key the caller holds.

use authcoin_core::{ChallengeId, ContentType, Digest, EirId, SessionId};
use authcoin_crypto::{challenge_digest, eir_digest, response_digest, signature_record_digest};
use serde::{Deserialize, Serialize};

/// Arguments of `register_eir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EirRequest {
    /// Public key material
    pub content: Vec<u8>,
    pub content_type: ContentType,
    pub identifiers: Vec<String>,
    pub hash: Vec<u8>,
    pub signature: Vec<u8>,
}

impl EirRequest {
    /// Unsigned request; call `sign_with` before submitting.
    pub fn new(content: Vec<u8>, content_type: ContentType, identifiers: Vec<String>) -> Self {
        Self {
            content,
            content_type,
            identifiers,
            hash: Vec::new(),
            signature: Vec::new(),
        }
    }

    pub fn digest(&self) -> Digest {
        eir_digest(&self.content, &self.content_type, &self.identifiers)
    }

    pub fn sign_with(mut self, sign: impl FnOnce(&Digest) -> Vec<u8>) -> Self {
        let digest = self.digest();
        self.hash = digest.as_bytes().to_vec();
        self.signature = sign(&digest);
        self
    }
}

/// Arguments of `register_challenge_record`, signed by the verifier identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRequest {
    pub challenge_id: ChallengeId,
    pub session_id: SessionId,
    pub challenge_type: String,
    pub payload: Vec<u8>,
    pub verifier_eir: EirId,
    pub target_eir: EirId,
    pub hash: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ChallengeRequest {
    pub fn new(
        challenge_id: ChallengeId,
        session_id: SessionId,
        challenge_type: impl Into<String>,
        payload: Vec<u8>,
        verifier_eir: EirId,
        target_eir: EirId,
    ) -> Self {
        Self {
            challenge_id,
            session_id,
            challenge_type: challenge_type.into(),
            payload,
            verifier_eir,
            target_eir,
            hash: Vec::new(),
            signature: Vec::new(),
        }
    }

    pub fn digest(&self) -> Digest {
        challenge_digest(
            &self.challenge_id,
            &self.session_id,
            &self.challenge_type,
            &self.payload,
            &self.verifier_eir,
            &self.target_eir,
        )
    }

    pub fn sign_with(mut self, sign: impl FnOnce(&Digest) -> Vec<u8>) -> Self {
        let digest = self.digest();
        self.hash = digest.as_bytes().to_vec();
        self.signature = sign(&digest);
        self
    }
}

/// Arguments of `register_challenge_response`, signed by the challenge target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRequest {
    pub session_id: SessionId,
    pub challenge_id: ChallengeId,
    pub content: Vec<u8>,
    pub hash: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ResponseRequest {
    pub fn new(session_id: SessionId, challenge_id: ChallengeId, content: Vec<u8>) -> Self {
        Self {
            session_id,
            challenge_id,
            content,
            hash: Vec::new(),
            signature: Vec::new(),
        }
    }

    pub fn digest(&self) -> Digest {
        response_digest(&self.session_id, &self.challenge_id, &self.content)
    }

    pub fn sign_with(mut self, sign: impl FnOnce(&Digest) -> Vec<u8>) -> Self {
        let digest = self.digest();
        self.hash = digest.as_bytes().to_vec();
        self.signature = sign(&digest);
        self
    }
}

/// Arguments of `register_signature_record`, signed by the challenge verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecordRequest {
    pub session_id: SessionId,
    pub challenge_id: ChallengeId,
    /// Ledger-specific amount attached to the verdict
    pub value: u64,
    /// Whether the verifier accepted the response
    pub verdict: bool,
    pub hash: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignatureRecordRequest {
    pub fn new(session_id: SessionId, challenge_id: ChallengeId, value: u64, verdict: bool) -> Self {
        Self {
            session_id,
            challenge_id,
            value,
            verdict,
            hash: Vec::new(),
            signature: Vec::new(),
        }
    }

    pub fn digest(&self) -> Digest {
        signature_record_digest(&self.session_id, &self.challenge_id, self.value, self.verdict)
    }

    pub fn sign_with(mut self, sign: impl FnOnce(&Digest) -> Vec<u8>) -> Self {
        let digest = self.digest();
        self.hash = digest.as_bytes().to_vec();
        self.signature = sign(&digest);
        self
    }
}
