//! Validation Authentication Entry - the two-party handshake aggregate.
//!
//! A VAE collects the records of one session through three additive phases:
//!
//! ```text
//! Empty -> Challenging (1..2 CR) -> Responding (1..2 CRR) -> Signing (1..2 CSR) -> Complete
//! ```
//!
//! Every insert checks the whole rule set against the current state before
//! touching any field, so a rejected insert leaves the entry unchanged.

use crate::error::{ReferenceKind, RegistryError, RegistryResult};
use crate::records::{ChallengeRecord, ChallengeResponseRecord, ChallengeSignatureRecord};
use authcoin_core::{AccountId, ChallengeId, EirId, SessionId};
use std::collections::HashMap;

/// Records of each kind one session may hold.
pub const MAX_RECORDS_PER_PHASE: usize = 2;

/// Handshake progress derived from the record counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VaeStatus {
    /// No challenge yet
    Empty,
    /// At least one challenge, no responses
    Challenging,
    /// At least one response, no verdicts
    Responding,
    /// One verdict recorded
    Signing,
    /// Both verdicts recorded
    Complete,
}

/// Append-only record list with a challenge-id index.
#[derive(Debug, Clone)]
struct Slots<T> {
    records: Vec<T>,
    index: HashMap<ChallengeId, usize>,
}

impl<T> Slots<T> {
    fn new() -> Self {
        Self {
            records: Vec::with_capacity(MAX_RECORDS_PER_PHASE),
            index: HashMap::with_capacity(MAX_RECORDS_PER_PHASE),
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn contains(&self, challenge_id: &ChallengeId) -> bool {
        self.index.contains_key(challenge_id)
    }

    fn get(&self, challenge_id: &ChallengeId) -> Option<&T> {
        self.index.get(challenge_id).map(|&slot| &self.records[slot])
    }

    fn push(&mut self, challenge_id: ChallengeId, record: T) {
        self.index.insert(challenge_id, self.records.len());
        self.records.push(record);
    }
}

#[derive(Debug, Clone)]
pub struct ValidationAuthenticationEntry {
    session_id: SessionId,
    creator: AccountId,
    challenges: Slots<ChallengeRecord>,
    responses: Slots<ChallengeResponseRecord>,
    signatures: Slots<ChallengeSignatureRecord>,
}

impl ValidationAuthenticationEntry {
    pub fn new(session_id: SessionId, creator: AccountId) -> Self {
        Self {
            session_id,
            creator,
            challenges: Slots::new(),
            responses: Slots::new(),
            signatures: Slots::new(),
        }
    }

    fn check_session(&self, session_id: &SessionId, what: &str) -> RegistryResult<()> {
        if session_id != &self.session_id {
            return Err(RegistryError::InvariantViolation(format!(
                "{what} belongs to session {session_id}, not {}",
                self.session_id
            )));
        }
        Ok(())
    }

    /// Add a challenge. The first challenge fixes the participant pair;
    /// the second must name the same two identities in either direction.
    pub fn add_challenge_record(&mut self, record: ChallengeRecord) -> RegistryResult<()> {
        self.check_session(record.session_id(), "challenge")?;

        if self.challenges.contains(record.challenge_id()) {
            return Err(RegistryError::duplicate(
                ReferenceKind::Challenge,
                record.challenge_id(),
            ));
        }
        if self.challenges.len() >= MAX_RECORDS_PER_PHASE {
            return Err(RegistryError::InvariantViolation(format!(
                "session {} already holds {MAX_RECORDS_PER_PHASE} challenges",
                self.session_id
            )));
        }
        if record.verifier_eir() == record.target_eir() {
            return Err(RegistryError::InvariantViolation(
                "challenge verifier and target must be different identities".to_string(),
            ));
        }
        if let Some((a, b)) = self.participants() {
            let same_pair = (record.verifier_eir() == &a && record.target_eir() == &b)
                || (record.verifier_eir() == &b && record.target_eir() == &a);
            if !same_pair {
                return Err(RegistryError::InvariantViolation(format!(
                    "session {} is bound to {a} and {b}",
                    self.session_id
                )));
            }
        }

        self.challenges.push(*record.challenge_id(), record);
        Ok(())
    }

    /// Add the response to an existing challenge.
    pub fn add_challenge_response(&mut self, record: ChallengeResponseRecord) -> RegistryResult<()> {
        self.check_session(record.session_id(), "response")?;

        if self.challenges.is_empty() {
            return Err(RegistryError::InvariantViolation(format!(
                "session {} has no challenges to respond to",
                self.session_id
            )));
        }
        if !self.challenges.contains(record.challenge_id()) {
            return Err(RegistryError::unknown(
                ReferenceKind::Challenge,
                record.challenge_id(),
            ));
        }
        if self.responses.contains(record.challenge_id()) {
            return Err(RegistryError::duplicate(
                ReferenceKind::Response,
                record.challenge_id(),
            ));
        }
        if self.responses.len() >= MAX_RECORDS_PER_PHASE {
            return Err(RegistryError::InvariantViolation(format!(
                "session {} already holds {MAX_RECORDS_PER_PHASE} responses",
                self.session_id
            )));
        }

        self.responses.push(*record.challenge_id(), record);
        Ok(())
    }

    /// Add a verdict. Requires at least one challenge and one response.
    pub fn add_challenge_signature(&mut self, record: ChallengeSignatureRecord) -> RegistryResult<()> {
        self.check_session(record.session_id(), "signature record")?;

        if self.challenges.is_empty() || self.responses.is_empty() {
            return Err(RegistryError::InvariantViolation(format!(
                "session {} needs a challenge and a response before signing",
                self.session_id
            )));
        }
        if !self.challenges.contains(record.challenge_id()) {
            return Err(RegistryError::unknown(
                ReferenceKind::Challenge,
                record.challenge_id(),
            ));
        }
        if self.signatures.contains(record.challenge_id()) {
            return Err(RegistryError::duplicate(
                ReferenceKind::Signature,
                record.challenge_id(),
            ));
        }
        // Backstop: each signature needs its own challenge, so the challenge
        // cap already rejects a third signature record before this point.
        if self.signatures.len() >= MAX_RECORDS_PER_PHASE {
            return Err(RegistryError::InvariantViolation(format!(
                "session {} already holds {MAX_RECORDS_PER_PHASE} signature records",
                self.session_id
            )));
        }

        self.signatures.push(*record.challenge_id(), record);
        Ok(())
    }

    pub fn status(&self) -> VaeStatus {
        if self.signatures.len() >= MAX_RECORDS_PER_PHASE {
            VaeStatus::Complete
        } else if !self.signatures.is_empty() {
            VaeStatus::Signing
        } else if !self.responses.is_empty() {
            VaeStatus::Responding
        } else if !self.challenges.is_empty() {
            VaeStatus::Challenging
        } else {
            VaeStatus::Empty
        }
    }

    /// The two identities bound by the first challenge, verifier first.
    pub fn participants(&self) -> Option<(EirId, EirId)> {
        self.challenges
            .records
            .first()
            .map(|first| (*first.verifier_eir(), *first.target_eir()))
    }

    pub fn involves(&self, eir: &EirId) -> bool {
        self.participants()
            .is_some_and(|(a, b)| &a == eir || &b == eir)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Account that submitted the first challenge.
    pub fn creator(&self) -> &AccountId {
        &self.creator
    }

    pub fn challenges(&self) -> &[ChallengeRecord] {
        &self.challenges.records
    }

    pub fn responses(&self) -> &[ChallengeResponseRecord] {
        &self.responses.records
    }

    pub fn signatures(&self) -> &[ChallengeSignatureRecord] {
        &self.signatures.records
    }

    pub fn challenge(&self, challenge_id: &ChallengeId) -> Option<&ChallengeRecord> {
        self.challenges.get(challenge_id)
    }

    pub fn response(&self, challenge_id: &ChallengeId) -> Option<&ChallengeResponseRecord> {
        self.responses.get(challenge_id)
    }

    pub fn signature(&self, challenge_id: &ChallengeId) -> Option<&ChallengeSignatureRecord> {
        self.signatures.get(challenge_id)
    }

    pub fn challenges_count(&self) -> usize {
        self.challenges.len()
    }

    pub fn responses_count(&self) -> usize {
        self.responses.len()
    }

    pub fn signatures_count(&self) -> usize {
        self.signatures.len()
    }
}
