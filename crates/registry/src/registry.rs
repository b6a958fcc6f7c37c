//! The AuthCoin registry aggregate.
//!
//! One value owns every piece of mutable state: the content-type to verifier
//! table, the identity records and the sessions. Each public mutation
//! validates everything it needs against the current state first and only
//! then writes, so a rejected call never leaves partial state behind.

use crate::error::{ReferenceKind, RegistryError, RegistryResult};
use crate::events::RegistryEvent;
use crate::records::{
    ChallengeRecord, ChallengeResponseRecord, ChallengeSignatureRecord, EntityIdentityRecord,
};
use crate::requests::{ChallengeRequest, EirRequest, ResponseRequest, SignatureRecordRequest};
use crate::vae::ValidationAuthenticationEntry;
use authcoin_core::{AccountId, ContentType, EirId, SessionId};
use authcoin_crypto::{eir_id, SharedVerifier};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Result of a revocation attempt.
///
/// A bad revocation signature is not an error: the call succeeds and the
/// identity stays active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationOutcome {
    Revoked,
    AlreadyRevoked,
    SignatureRejected,
}

#[derive(Debug, Clone)]
pub struct Registry {
    owner: AccountId,
    verifiers: HashMap<ContentType, SharedVerifier>,
    /// Every verifier registration in call order, duplicates included
    verifier_types: Vec<ContentType>,
    eirs: HashMap<EirId, EntityIdentityRecord>,
    vaes: HashMap<SessionId, ValidationAuthenticationEntry>,
    sessions_by_eir: HashMap<EirId, Vec<SessionId>>,
    events: Vec<RegistryEvent>,
}

impl Registry {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            verifiers: HashMap::new(),
            verifier_types: Vec::new(),
            eirs: HashMap::new(),
            vaes: HashMap::new(),
            sessions_by_eir: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    fn emit(&mut self, event: RegistryEvent) {
        debug!(event = event.name(), "Registry event emitted");
        self.events.push(event);
    }

    /// Events emitted so far, oldest first.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Remove and return the events emitted after the first `mark`.
    pub(crate) fn drain_events_since(&mut self, mark: usize) -> Vec<RegistryEvent> {
        self.events.split_off(mark.min(self.events.len()))
    }

    // ---------------------------------------------------------------------
    // Signature verifiers
    // ---------------------------------------------------------------------

    /// Bind `verifier` to `content_type`. Owner only; last write wins.
    pub fn register_signature_verifier(
        &mut self,
        caller: &AccountId,
        verifier: SharedVerifier,
        content_type: ContentType,
    ) -> RegistryResult<()> {
        if caller != &self.owner {
            warn!(
                caller = %caller,
                content_type = %content_type.label(),
                "Verifier registration denied"
            );
            return Err(RegistryError::AccessDenied {
                caller: caller.clone(),
            });
        }

        let scheme = verifier.scheme();
        if let Some(previous) = self.verifiers.insert(content_type, verifier) {
            info!(
                content_type = %content_type.label(),
                previous = previous.scheme(),
                scheme,
                "Signature verifier replaced"
            );
        } else {
            info!(
                content_type = %content_type.label(),
                scheme,
                "Signature verifier registered"
            );
        }
        self.verifier_types.push(content_type);
        self.emit(RegistryEvent::SignatureVerifierRegistered {
            content_type,
            scheme: scheme.to_string(),
        });
        Ok(())
    }

    pub fn get_signature_verifier(&self, content_type: &ContentType) -> Option<SharedVerifier> {
        self.verifiers.get(content_type).cloned()
    }

    pub fn get_signature_verifier_types(&self) -> &[ContentType] {
        &self.verifier_types
    }

    fn resolve_verifier(&self, content_type: &ContentType) -> RegistryResult<SharedVerifier> {
        self.get_signature_verifier(content_type).ok_or_else(|| {
            RegistryError::VerificationError(format!(
                "no signature verifier for content type {}",
                content_type.label()
            ))
        })
    }

    // ---------------------------------------------------------------------
    // Identity records
    // ---------------------------------------------------------------------

    /// Register a self-signed identity and return its id.
    pub fn register_eir(&mut self, request: EirRequest) -> RegistryResult<EirId> {
        let content_type = request.content_type;
        let result = self.insert_eir(request);
        match &result {
            Ok(id) => info!(eir_id = %id, content_type = %content_type.label(), "EIR registered"),
            Err(e) => warn!(
                content_type = %content_type.label(),
                error = %e,
                "EIR registration rejected"
            ),
        }
        result
    }

    fn insert_eir(&mut self, request: EirRequest) -> RegistryResult<EirId> {
        let scheme = self.resolve_verifier(&request.content_type)?;

        let id = eir_id(&request.content);
        if self.eirs.contains_key(&id) {
            return Err(RegistryError::duplicate(ReferenceKind::Eir, id));
        }

        let record = EntityIdentityRecord::verify_new(request, scheme.as_ref())?;
        let content_type = *record.content_type();
        self.eirs.insert(id, record);
        self.emit(RegistryEvent::NewEir { id, content_type });
        Ok(id)
    }

    pub fn get_eir(&self, id: &EirId) -> Option<&EntityIdentityRecord> {
        self.eirs.get(id)
    }

    /// Look an identity up by its key material.
    pub fn get_eir_by_content(&self, content: &[u8]) -> Option<&EntityIdentityRecord> {
        self.eirs.get(&eir_id(content))
    }

    pub fn get_eir_count(&self) -> usize {
        self.eirs.len()
    }

    /// Revoke an identity with a signature from its own key.
    ///
    /// Only an unknown id is an error. A rejected signature leaves the
    /// identity untouched and reports [`RevocationOutcome::SignatureRejected`].
    pub fn revoke_eir(&mut self, id: &EirId, signature: &[u8]) -> RegistryResult<RevocationOutcome> {
        let record = self
            .eirs
            .get(id)
            .ok_or_else(|| RegistryError::unknown(ReferenceKind::Eir, id))?;

        if record.is_revoked() {
            debug!(eir_id = %id, "EIR already revoked");
            return Ok(RevocationOutcome::AlreadyRevoked);
        }

        let accepted = self
            .get_signature_verifier(record.content_type())
            .is_some_and(|scheme| record.accepts_revocation(signature, scheme.as_ref()));
        if !accepted {
            warn!(eir_id = %id, "Revocation signature rejected; identity unchanged");
            return Ok(RevocationOutcome::SignatureRejected);
        }

        if let Some(record) = self.eirs.get_mut(id) {
            record.mark_revoked();
        }
        info!(eir_id = %id, "EIR revoked");
        self.emit(RegistryEvent::EirRevoked { id: *id });
        Ok(RevocationOutcome::Revoked)
    }

    fn active_eir(&self, id: &EirId) -> RegistryResult<&EntityIdentityRecord> {
        let record = self
            .eirs
            .get(id)
            .ok_or_else(|| RegistryError::unknown(ReferenceKind::Eir, id))?;
        if record.is_revoked() {
            return Err(RegistryError::RevokedIdentity { id: *id });
        }
        Ok(record)
    }

    // ---------------------------------------------------------------------
    // Handshake
    // ---------------------------------------------------------------------

    /// Register a challenge, creating the session on its first challenge.
    pub fn register_challenge_record(
        &mut self,
        caller: &AccountId,
        request: ChallengeRequest,
    ) -> RegistryResult<()> {
        let session_id = request.session_id;
        let challenge_id = request.challenge_id;
        self.insert_challenge_record(caller, request)
            .inspect(|_| {
                info!(session_id = %session_id, challenge_id = %challenge_id, "Challenge registered")
            })
            .inspect_err(|e| {
                warn!(
                    session_id = %session_id,
                    challenge_id = %challenge_id,
                    error = %e,
                    "Challenge rejected"
                )
            })
    }

    fn insert_challenge_record(
        &mut self,
        caller: &AccountId,
        request: ChallengeRequest,
    ) -> RegistryResult<()> {
        let verifier = self.active_eir(&request.verifier_eir)?;
        self.active_eir(&request.target_eir)?;
        let scheme = self.resolve_verifier(verifier.content_type())?;
        let record = ChallengeRecord::verify_new(request, verifier, scheme.as_ref())?;

        let session_id = *record.session_id();
        let challenge_id = *record.challenge_id();

        if let Some(vae) = self.vaes.get_mut(&session_id) {
            vae.add_challenge_record(record)?;
        } else {
            let mut vae = ValidationAuthenticationEntry::new(session_id, caller.clone());
            vae.add_challenge_record(record)?;
            if let Some((a, b)) = vae.participants() {
                self.sessions_by_eir.entry(a).or_default().push(session_id);
                self.sessions_by_eir.entry(b).or_default().push(session_id);
            }
            self.vaes.insert(session_id, vae);
            info!(session_id = %session_id, creator = %caller, "VAE created");
            self.emit(RegistryEvent::NewVae { session_id });
        }

        self.emit(RegistryEvent::NewChallengeRecord {
            session_id,
            challenge_id,
        });
        Ok(())
    }

    /// Register the target's response to a challenge.
    pub fn register_challenge_response(&mut self, request: ResponseRequest) -> RegistryResult<()> {
        let session_id = request.session_id;
        let challenge_id = request.challenge_id;
        self.insert_challenge_response(request)
            .inspect(|_| {
                info!(session_id = %session_id, challenge_id = %challenge_id, "Challenge response registered")
            })
            .inspect_err(|e| {
                warn!(
                    session_id = %session_id,
                    challenge_id = %challenge_id,
                    error = %e,
                    "Challenge response rejected"
                )
            })
    }

    fn insert_challenge_response(&mut self, request: ResponseRequest) -> RegistryResult<()> {
        let session_id = request.session_id;
        let challenge_id = request.challenge_id;

        let vae = self
            .vaes
            .get(&session_id)
            .ok_or_else(|| RegistryError::unknown(ReferenceKind::Session, session_id))?;
        let challenge = vae
            .challenge(&challenge_id)
            .ok_or_else(|| RegistryError::unknown(ReferenceKind::Challenge, challenge_id))?;

        let target = self.active_eir(challenge.target_eir())?;
        let scheme = self.resolve_verifier(target.content_type())?;
        let record = ChallengeResponseRecord::verify_new(request, target, scheme.as_ref())?;

        self.vaes
            .get_mut(&session_id)
            .ok_or_else(|| RegistryError::unknown(ReferenceKind::Session, session_id))?
            .add_challenge_response(record)?;

        self.emit(RegistryEvent::NewChallengeResponse {
            session_id,
            challenge_id,
        });
        Ok(())
    }

    /// Register the verifier's verdict on a response.
    pub fn register_signature_record(
        &mut self,
        request: SignatureRecordRequest,
    ) -> RegistryResult<()> {
        let session_id = request.session_id;
        let challenge_id = request.challenge_id;
        self.insert_signature_record(request)
            .inspect(|_| {
                info!(session_id = %session_id, challenge_id = %challenge_id, "Signature record registered")
            })
            .inspect_err(|e| {
                warn!(
                    session_id = %session_id,
                    challenge_id = %challenge_id,
                    error = %e,
                    "Signature record rejected"
                )
            })
    }

    fn insert_signature_record(&mut self, request: SignatureRecordRequest) -> RegistryResult<()> {
        let session_id = request.session_id;
        let challenge_id = request.challenge_id;
        let value = request.value;
        let verdict = request.verdict;

        let vae = self
            .vaes
            .get(&session_id)
            .ok_or_else(|| RegistryError::unknown(ReferenceKind::Session, session_id))?;
        let challenge = vae
            .challenge(&challenge_id)
            .ok_or_else(|| RegistryError::unknown(ReferenceKind::Challenge, challenge_id))?;

        let verifier = self.active_eir(challenge.verifier_eir())?;
        let scheme = self.resolve_verifier(verifier.content_type())?;
        let record = ChallengeSignatureRecord::verify_new(request, verifier, scheme.as_ref())?;

        self.vaes
            .get_mut(&session_id)
            .ok_or_else(|| RegistryError::unknown(ReferenceKind::Session, session_id))?
            .add_challenge_signature(record)?;

        self.emit(RegistryEvent::NewChallengeSignature {
            session_id,
            challenge_id,
            value,
            verdict,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Sessions
    // ---------------------------------------------------------------------

    pub fn get_vae(&self, session_id: &SessionId) -> Option<&ValidationAuthenticationEntry> {
        self.vaes.get(session_id)
    }

    pub fn get_vae_count(&self) -> usize {
        self.vaes.len()
    }

    /// Sessions an identity participates in, in creation order.
    pub fn get_vae_array_by_eir_id(&self, eir: &EirId) -> &[SessionId] {
        self.sessions_by_eir
            .get(eir)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
