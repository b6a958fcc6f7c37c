//! Ledger host: the single sequential transaction log around the registry.
//!
//! The host is the only writer. Each submitted transaction runs against a
//! staged copy of the registry; the copy replaces the live state only after
//! the transaction has been appended to the durable ledger. On open the
//! host replays every stored transaction, so the registry state always
//! equals the fold of the ledger.

use crate::error::RegistryError;
use crate::events::RegistryEvent;
use crate::registry::Registry;
use crate::transaction::Transaction;
use authcoin_core::{
    AccountId, AuthCoinConfig, ContentType, CoreError, LedgerEntry, LedgerError, TransactionLedger,
};
use authcoin_crypto::{CryptoError, VerifierKind};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Transaction rejected: {0}")]
    Rejected(#[from] RegistryError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Transaction encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Replay failed at seq_no {seq_no}: {source}")]
    Replay {
        seq_no: u64,
        #[source]
        source: RegistryError,
    },
}

impl From<CoreError> for HostError {
    fn from(err: CoreError) -> Self {
        HostError::Config(err.to_string())
    }
}

impl From<CryptoError> for HostError {
    fn from(err: CryptoError) -> Self {
        HostError::Config(err.to_string())
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Proof of acceptance for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub seq_no: u64,
    pub tx_id: String,
    pub tx_hash: Vec<u8>,
    pub events: Vec<RegistryEvent>,
}

pub struct LedgerHost {
    registry: Registry,
    ledger: TransactionLedger,
}

impl LedgerHost {
    /// Open the configured ledger, replay it, and seed the configured
    /// verifiers when the ledger is new.
    pub fn open(config: &AuthCoinConfig) -> HostResult<Self> {
        config.validate()?;
        let ledger = TransactionLedger::open(&config.ledger.path, config.ledger.node_id.clone())?;
        let owner = AccountId::new(config.registry.owner.clone());
        let fresh = ledger.is_empty()?;
        let mut host = Self::with_ledger(owner.clone(), ledger)?;

        if fresh {
            for binding in &config.verifiers {
                let scheme: VerifierKind = binding.scheme.parse()?;
                let content_type = ContentType::from_label(&binding.content_type)?;
                host.submit(
                    &owner,
                    Transaction::RegisterSignatureVerifier {
                        scheme,
                        content_type,
                    },
                )?;
            }
            info!(
                verifiers = config.verifiers.len(),
                "Genesis verifiers registered"
            );
        }

        Ok(host)
    }

    /// Wrap an open ledger, rebuilding registry state from its entries.
    pub fn with_ledger(owner: AccountId, ledger: TransactionLedger) -> HostResult<Self> {
        let mut registry = Registry::new(owner);
        let entries = ledger.all_entries()?;
        for (seq_no, entry) in &entries {
            let transaction: Transaction = serde_json::from_slice(&entry.payload)?;
            let caller = AccountId::new(entry.caller.clone());
            registry
                .apply(&caller, transaction)
                .map_err(|source| HostError::Replay {
                    seq_no: *seq_no,
                    source,
                })?;
        }

        info!(
            node_id = ledger.node_id(),
            replayed = entries.len(),
            eirs = registry.get_eir_count(),
            vaes = registry.get_vae_count(),
            "Registry state rebuilt from ledger"
        );
        Ok(Self { registry, ledger })
    }

    /// Execute a transaction and persist it. A rejected transaction is not
    /// written and leaves the registry unchanged.
    pub fn submit(&mut self, caller: &AccountId, transaction: Transaction) -> HostResult<Receipt> {
        let name = transaction.name();
        let payload = serde_json::to_vec(&transaction)?;

        let mut staged = self.registry.clone();
        let events = staged.apply(caller, transaction).map_err(|e| {
            warn!(caller = %caller, tx = name, error = %e, "Transaction rejected");
            e
        })?;

        let prev_tx_hash = self.ledger.latest_hash()?;
        let entry = LedgerEntry::new(caller.as_str(), payload, prev_tx_hash, now_millis());
        let tx_id = entry.tx_id.clone();
        let tx_hash = entry.tx_hash.clone();
        let seq_no = self.ledger.append_entry(entry)?;

        self.registry = staged;
        debug!(seq_no, tx_id = %tx_id, tx = name, events = events.len(), "Transaction committed");

        Ok(Receipt {
            seq_no,
            tx_id,
            tx_hash,
            events,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
