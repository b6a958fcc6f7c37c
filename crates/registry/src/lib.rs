//! AuthCoin identity registry.
//!
//! Entities publish self-signed identity records (EIRs), then authenticate
//! each other pairwise through a Validation Authentication Entry (VAE):
//! each side challenges the other, answers the counterpart's challenge and
//! finally signs a verdict on the answer it received.
//!
//! # Architecture
//!
//! - [`Registry`]: the aggregate root and sole mutation entry point
//! - [`ValidationAuthenticationEntry`]: the per-session state machine
//! - [`records`]: verified EIR, challenge, response and signature records
//! - [`LedgerHost`]: sequential transaction log with durable replay
//!
//! Signature checking is delegated to the pluggable verifiers in
//! `authcoin-crypto`, selected by each identity's content type.

pub mod error;
pub mod events;
pub mod host;
pub mod records;
pub mod registry;
pub mod requests;
pub mod transaction;
pub mod vae;

pub use error::{ReferenceKind, RegistryError, RegistryResult};
pub use events::RegistryEvent;
pub use host::{HostError, HostResult, LedgerHost, Receipt};
pub use records::{
    ChallengeRecord, ChallengeResponseRecord, ChallengeSignatureRecord, EntityIdentityRecord,
};
pub use registry::{Registry, RevocationOutcome};
pub use requests::{ChallengeRequest, EirRequest, ResponseRequest, SignatureRecordRequest};
pub use transaction::Transaction;
pub use vae::{ValidationAuthenticationEntry, VaeStatus, MAX_RECORDS_PER_PHASE};
