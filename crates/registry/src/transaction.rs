//! Serializable registry calls.
//!
//! A [`Transaction`] is what the host ledger stores. Applying the same
//! sequence of transactions to a fresh registry always rebuilds the same
//! state, which is how the host recovers after a restart.

use crate::error::RegistryResult;
use crate::events::RegistryEvent;
use crate::registry::Registry;
use crate::requests::{ChallengeRequest, EirRequest, ResponseRequest, SignatureRecordRequest};
use authcoin_core::{AccountId, ContentType, EirId};
use authcoin_crypto::VerifierKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transaction {
    RegisterSignatureVerifier {
        scheme: VerifierKind,
        content_type: ContentType,
    },
    RegisterEir(EirRequest),
    RevokeEir {
        id: EirId,
        signature: Vec<u8>,
    },
    RegisterChallengeRecord(ChallengeRequest),
    RegisterChallengeResponse(ResponseRequest),
    RegisterSignatureRecord(SignatureRecordRequest),
}

impl Transaction {
    pub fn name(&self) -> &'static str {
        match self {
            Transaction::RegisterSignatureVerifier { .. } => "register_signature_verifier",
            Transaction::RegisterEir(_) => "register_eir",
            Transaction::RevokeEir { .. } => "revoke_eir",
            Transaction::RegisterChallengeRecord(_) => "register_challenge_record",
            Transaction::RegisterChallengeResponse(_) => "register_challenge_response",
            Transaction::RegisterSignatureRecord(_) => "register_signature_record",
        }
    }
}

impl Registry {
    /// Execute one transaction on behalf of `caller` and return the events
    /// it emitted. Those events are drained from the registry log.
    pub fn apply(
        &mut self,
        caller: &AccountId,
        transaction: Transaction,
    ) -> RegistryResult<Vec<RegistryEvent>> {
        let mark = self.events().len();

        match transaction {
            Transaction::RegisterSignatureVerifier {
                scheme,
                content_type,
            } => self.register_signature_verifier(caller, scheme.build(), content_type)?,
            Transaction::RegisterEir(request) => {
                self.register_eir(request)?;
            }
            Transaction::RevokeEir { id, signature } => {
                self.revoke_eir(&id, &signature)?;
            }
            Transaction::RegisterChallengeRecord(request) => {
                self.register_challenge_record(caller, request)?
            }
            Transaction::RegisterChallengeResponse(request) => {
                self.register_challenge_response(request)?
            }
            Transaction::RegisterSignatureRecord(request) => {
                self.register_signature_record(request)?
            }
        }

        Ok(self.drain_events_since(mark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use authcoin_crypto::Ed25519Signer;

    fn ed25519() -> ContentType {
        ContentType::from_label("ed25519").unwrap()
    }

    #[test]
    fn test_transaction_json_is_tagged() {
        let tx = Transaction::RegisterSignatureVerifier {
            scheme: VerifierKind::Ed25519,
            content_type: ed25519(),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["op"], tx.name());
        assert_eq!(json["scheme"], "ed25519");

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_apply_returns_emitted_events() {
        let owner = AccountId::new("owner");
        let mut registry = Registry::new(owner.clone());
        let events = registry
            .apply(
                &owner,
                Transaction::RegisterSignatureVerifier {
                    scheme: VerifierKind::Ed25519,
                    content_type: ed25519(),
                },
            )
            .unwrap();
        assert_eq!(events.len(), 1);

        let signer = Ed25519Signer::from_seed([9u8; 32]);
        let request = EirRequest::new(signer.public_content(), ed25519(), vec![])
            .sign_with(|d| signer.sign_digest(d));
        let events = registry
            .apply(&AccountId::new("anyone"), Transaction::RegisterEir(request))
            .unwrap();
        assert!(matches!(events.as_slice(), [RegistryEvent::NewEir { .. }]));
        assert!(registry.events().is_empty());
    }

    #[test]
    fn test_apply_keeps_events_from_direct_calls() {
        let owner = AccountId::new("owner");
        let mut registry = Registry::new(owner.clone());
        registry
            .register_signature_verifier(&owner, VerifierKind::Ed25519.build(), ed25519())
            .unwrap();

        let signer = Ed25519Signer::from_seed([9u8; 32]);
        let request = EirRequest::new(signer.public_content(), ed25519(), vec![])
            .sign_with(|d| signer.sign_digest(d));
        let events = registry
            .apply(&owner, Transaction::RegisterEir(request))
            .unwrap();

        assert_eq!(events.len(), 1);
        assert!(matches!(
            registry.events(),
            [RegistryEvent::SignatureVerifierRegistered { .. }]
        ));
    }

    #[test]
    fn test_apply_rejected_revocation_emits_nothing() {
        let owner = AccountId::new("owner");
        let mut registry = Registry::new(owner.clone());
        registry
            .apply(
                &owner,
                Transaction::RegisterSignatureVerifier {
                    scheme: VerifierKind::Ed25519,
                    content_type: ed25519(),
                },
            )
            .unwrap();
        let signer = Ed25519Signer::from_seed([9u8; 32]);
        let request = EirRequest::new(signer.public_content(), ed25519(), vec![])
            .sign_with(|d| signer.sign_digest(d));
        let id = registry.register_eir(request).unwrap();

        let events = registry
            .apply(
                &owner,
                Transaction::RevokeEir {
                    id,
                    signature: vec![0u8; 64],
                },
            )
            .unwrap();
        assert!(events.is_empty());

        let missing = EirId::from_label("missing").unwrap();
        let err = registry
            .apply(
                &owner,
                Transaction::RevokeEir {
                    id: missing,
                    signature: vec![],
                },
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownReference { .. }));
    }
}
