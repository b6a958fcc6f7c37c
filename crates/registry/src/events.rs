//! Events emitted by successful registry mutations.
//!
//! Events are informational: off-ledger indexers consume them, the registry
//! itself never reads them back.

use authcoin_core::{ChallengeId, ContentType, EirId, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    SignatureVerifierRegistered {
        content_type: ContentType,
        scheme: String,
    },
    NewEir {
        id: EirId,
        content_type: ContentType,
    },
    EirRevoked {
        id: EirId,
    },
    /// First challenge of a previously unseen session
    NewVae {
        session_id: SessionId,
    },
    NewChallengeRecord {
        session_id: SessionId,
        challenge_id: ChallengeId,
    },
    NewChallengeResponse {
        session_id: SessionId,
        challenge_id: ChallengeId,
    },
    NewChallengeSignature {
        session_id: SessionId,
        challenge_id: ChallengeId,
        value: u64,
        verdict: bool,
    },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::SignatureVerifierRegistered { .. } => "signature_verifier_registered",
            RegistryEvent::NewEir { .. } => "new_eir",
            RegistryEvent::EirRevoked { .. } => "eir_revoked",
            RegistryEvent::NewVae { .. } => "new_vae",
            RegistryEvent::NewChallengeRecord { .. } => "new_challenge_record",
            RegistryEvent::NewChallengeResponse { .. } => "new_challenge_response",
            RegistryEvent::NewChallengeSignature { .. } => "new_challenge_signature",
        }
    }
}
