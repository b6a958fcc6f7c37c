//! Core functionality for the AuthCoin identity registry.
//!
//! This crate provides the fixed-width identifier types, configuration,
//! logging setup and the durable transaction ledger shared by the crypto and
//! registry crates.

pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod types;

pub use config::{AuthCoinConfig, LedgerConfig, LoggingConfig, RegistryConfig, VerifierBinding};
pub use error::{CoreError, Result};
pub use ledger::{
    LedgerEntry, LedgerError, LedgerHealth, LedgerHealthInfo, LedgerMetrics, TransactionLedger,
    GENESIS_HASH,
};
pub use types::{AccountId, ChallengeId, ContentType, Digest, EirId, SessionId, ID_LEN};
