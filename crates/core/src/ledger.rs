//! Transaction Ledger - Append-Only Storage for Accepted Registry Calls
//!
//! The host ledger persists every accepted transaction so the registry state
//! can be rebuilt by replay. Each entry carries:
//! - seq_no: Monotonically increasing sequence number
//! - tx_id: Unique transaction identifier (prefix of the tx hash)
//! - timestamp: Acceptance time
//! - caller: Account that submitted the transaction
//! - tx_hash: BLAKE3 hash binding prev hash, caller, timestamp and payload
//! - prev_tx_hash: Hash of the previous entry (genesis is all zeros)
//! - payload: Serialized transaction
//!
//! # Guarantees
//!
//! - Strict ordering: seq_no increases by 1 for each entry
//! - Chain continuity: prev_tx_hash must match the previous entry's tx_hash
//! - Append-only: No in-place updates or deletes
//! - Durability: SQLite WAL mode
//! - Corruption detection: startup checks re-derive every hash

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Previous-hash value of the first entry.
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// One accepted transaction with its chain pointers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    /// Unique transaction identifier (hex prefix of `tx_hash`)
    pub tx_id: String,
    /// Unix milliseconds
    pub timestamp: u64,
    /// Account that submitted the transaction
    pub caller: String,
    /// BLAKE3 hash of this entry
    pub tx_hash: Vec<u8>,
    /// Hash of the previous entry
    pub prev_tx_hash: Vec<u8>,
    /// Serialized transaction
    pub payload: Vec<u8>,
}

impl LedgerEntry {
    /// Build an entry chained onto `prev_tx_hash`.
    pub fn new(
        caller: impl Into<String>,
        payload: Vec<u8>,
        prev_tx_hash: Vec<u8>,
        timestamp: u64,
    ) -> Self {
        let caller = caller.into();
        let tx_hash = Self::compute_tx_hash(&prev_tx_hash, &caller, timestamp, &payload);
        Self {
            tx_id: hex::encode(&tx_hash[..16]),
            timestamp,
            caller,
            tx_hash,
            prev_tx_hash,
            payload,
        }
    }

    pub fn compute_tx_hash(
        prev_tx_hash: &[u8],
        caller: &str,
        timestamp: u64,
        payload: &[u8],
    ) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(prev_tx_hash);
        hasher.update(&(caller.len() as u64).to_le_bytes());
        hasher.update(caller.as_bytes());
        hasher.update(&timestamp.to_le_bytes());
        hasher.update(payload);
        hasher.finalize().as_bytes().to_vec()
    }

    fn hash_is_consistent(&self) -> bool {
        Self::compute_tx_hash(&self.prev_tx_hash, &self.caller, self.timestamp, &self.payload)
            == self.tx_hash
    }
}

/// Ledger health status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerHealth {
    /// Ledger is healthy and accepting appends
    Ok,
    /// Ledger failed its continuity check and refuses appends
    Corrupted {
        /// Last entry that passed verification, if any
        last_good_seq_no: Option<u64>,
        /// First entry that failed verification
        first_bad_seq_no: u64,
        /// Description of the failure
        error_type: String,
    },
}

impl LedgerHealth {
    pub fn is_ok(&self) -> bool {
        matches!(self, LedgerHealth::Ok)
    }
}

/// Ledger health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerHealthInfo {
    /// Current health status
    pub status: LedgerHealth,
    /// Node that owns this ledger
    pub node_id: String,
}

/// Errors that can occur in ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Chain ordering violation: expected prev_hash {expected}, got {actual}")]
    ChainOrderingViolation { expected: String, actual: String },

    #[error("Duplicate transaction ID: {tx_id}")]
    DuplicateTxId { tx_id: String },

    #[error("Entry not found: seq_no={seq_no}")]
    EntryNotFound { seq_no: u64 },

    #[error("Ledger corrupted: {0}")]
    CorruptionDetected(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Observability metrics for the ledger
#[derive(Debug, Default, Clone)]
pub struct LedgerMetrics {
    /// Entries appended since the ledger was opened
    pub ledger_entries_appended_total: u64,
    /// Continuity checks run since the ledger was opened
    pub ledger_startup_checks_total: u64,
    /// Continuity checks that found corruption
    pub ledger_corruption_detections_total: u64,
}

const SELECT_COLUMNS: &str = "SELECT seq_no, tx_id, timestamp, caller, tx_hash, prev_tx_hash, payload FROM ledger_transactions";

/// Append-only transaction ledger with SQLite backend
pub struct TransactionLedger {
    conn: Connection,
    node_id: String,
    health: LedgerHealth,
    metrics: LedgerMetrics,
}

impl TransactionLedger {
    /// Create or open a ledger at the specified path and run the startup
    /// continuity check.
    pub fn open(path: impl AsRef<Path>, node_id: impl Into<String>) -> Result<Self> {
        let node_id = node_id.into();
        let path = path.as_ref();

        info!(
            node_id = %node_id,
            path = %path.display(),
            "Opening transaction ledger"
        );

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::init_schema(&conn)?;

        let mut ledger = Self {
            conn,
            node_id,
            health: LedgerHealth::Ok,
            metrics: LedgerMetrics::default(),
        };

        ledger.startup_continuity_check()?;

        Ok(ledger)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_transactions (
                seq_no INTEGER PRIMARY KEY AUTOINCREMENT,
                tx_id TEXT NOT NULL UNIQUE,
                timestamp INTEGER NOT NULL,
                caller TEXT NOT NULL,
                tx_hash BLOB NOT NULL,
                prev_tx_hash BLOB NOT NULL,
                payload BLOB NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
            );

            CREATE INDEX IF NOT EXISTS idx_tx_id ON ledger_transactions(tx_id);
            "#,
        )?;

        Ok(())
    }

    fn read_row(row: &Row<'_>) -> rusqlite::Result<(u64, LedgerEntry)> {
        Ok((
            row.get::<_, i64>(0)? as u64,
            LedgerEntry {
                tx_id: row.get(1)?,
                timestamp: row.get::<_, i64>(2)? as u64,
                caller: row.get(3)?,
                tx_hash: row.get(4)?,
                prev_tx_hash: row.get(5)?,
                payload: row.get(6)?,
            },
        ))
    }

    /// Append an entry. Enforces chain continuity and tx_id uniqueness.
    pub fn append_entry(&mut self, entry: LedgerEntry) -> Result<u64> {
        if !self.health.is_ok() {
            warn!(
                node_id = %self.node_id,
                "Attempted to append to corrupted ledger"
            );
            return Err(LedgerError::CorruptionDetected(
                "Cannot append to corrupted ledger".to_string(),
            ));
        }

        if entry.tx_id.is_empty() {
            return Err(LedgerError::InvalidEntry("tx_id cannot be empty".to_string()));
        }
        if !entry.hash_is_consistent() {
            return Err(LedgerError::InvalidEntry(format!(
                "tx_hash does not match contents of {}",
                entry.tx_id
            )));
        }

        let tx = self.conn.transaction()?;

        let expected_prev_hash = tx
            .query_row(
                "SELECT tx_hash FROM ledger_transactions ORDER BY seq_no DESC LIMIT 1",
                [],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?
            .unwrap_or_else(|| GENESIS_HASH.to_vec());

        if entry.prev_tx_hash != expected_prev_hash {
            return Err(LedgerError::ChainOrderingViolation {
                expected: hex::encode(&expected_prev_hash),
                actual: hex::encode(&entry.prev_tx_hash),
            });
        }

        let duplicate: Option<i64> = tx
            .query_row(
                "SELECT seq_no FROM ledger_transactions WHERE tx_id = ?1",
                [&entry.tx_id],
                |row| row.get(0),
            )
            .optional()?;
        if duplicate.is_some() {
            return Err(LedgerError::DuplicateTxId {
                tx_id: entry.tx_id.clone(),
            });
        }

        tx.execute(
            r#"
            INSERT INTO ledger_transactions (
                tx_id, timestamp, caller, tx_hash, prev_tx_hash, payload
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.tx_id,
                entry.timestamp as i64,
                entry.caller,
                entry.tx_hash,
                entry.prev_tx_hash,
                entry.payload,
            ],
        )?;

        let seq_no = tx.last_insert_rowid() as u64;
        tx.commit()?;

        self.metrics.ledger_entries_appended_total += 1;

        debug!(
            node_id = %self.node_id,
            seq_no = seq_no,
            tx_id = %entry.tx_id,
            "Transaction appended to ledger"
        );

        Ok(seq_no)
    }

    /// Hash the next entry must chain onto.
    pub fn latest_hash(&self) -> Result<Vec<u8>> {
        Ok(self
            .get_latest_entry()?
            .map(|(_, entry)| entry.tx_hash)
            .unwrap_or_else(|| GENESIS_HASH.to_vec()))
    }

    pub fn get_latest_entry(&self) -> Result<Option<(u64, LedgerEntry)>> {
        let sql = format!("{} ORDER BY seq_no DESC LIMIT 1", SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row([], Self::read_row).optional()?)
    }

    pub fn get_entry_by_seq_no(&self, seq_no: u64) -> Result<LedgerEntry> {
        let sql = format!("{} WHERE seq_no = ?1", SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        stmt.query_row([seq_no as i64], Self::read_row)
            .map(|(_, entry)| entry)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => LedgerError::EntryNotFound { seq_no },
                e => LedgerError::DatabaseError(e),
            })
    }

    /// Every entry in sequence order.
    pub fn all_entries(&self) -> Result<Vec<(u64, LedgerEntry)>> {
        let sql = format!("{} ORDER BY seq_no ASC", SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], Self::read_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn len(&self) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM ledger_transactions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Verify sequence numbers, chain pointers and entry hashes.
    pub fn startup_continuity_check(&mut self) -> Result<()> {
        self.metrics.ledger_startup_checks_total += 1;

        info!(node_id = %self.node_id, "Starting ledger continuity check");

        let entries = self.all_entries()?;

        if entries.is_empty() {
            info!(node_id = %self.node_id, "Ledger is empty, continuity check passed");
            return Ok(());
        }

        let mut expected_seq_no = entries[0].0;
        let mut prev_tx_hash = GENESIS_HASH.to_vec();

        for (i, (seq_no, entry)) in entries.iter().enumerate() {
            let failure = if *seq_no != expected_seq_no {
                Some(format!(
                    "Sequence gap: expected {}, found {}",
                    expected_seq_no, seq_no
                ))
            } else if entry.prev_tx_hash != prev_tx_hash {
                Some(format!(
                    "Hash mismatch at seq_no {}: expected prev_hash {}, got {}",
                    seq_no,
                    hex::encode(&prev_tx_hash),
                    hex::encode(&entry.prev_tx_hash)
                ))
            } else if !entry.hash_is_consistent() {
                Some(format!("Entry hash mismatch at seq_no {}", seq_no))
            } else {
                None
            };

            if let Some(error_type) = failure {
                self.health = LedgerHealth::Corrupted {
                    last_good_seq_no: if i > 0 { Some(entries[i - 1].0) } else { None },
                    first_bad_seq_no: *seq_no,
                    error_type: error_type.clone(),
                };
                self.metrics.ledger_corruption_detections_total += 1;

                error!(
                    node_id = %self.node_id,
                    seq_no = seq_no,
                    error_type = %error_type,
                    "Ledger corruption detected"
                );

                return Err(LedgerError::CorruptionDetected(error_type));
            }

            prev_tx_hash = entry.tx_hash.clone();
            expected_seq_no += 1;
        }

        info!(
            node_id = %self.node_id,
            entry_count = entries.len(),
            "Ledger continuity check passed"
        );

        Ok(())
    }

    pub fn get_ledger_health(&self) -> LedgerHealthInfo {
        LedgerHealthInfo {
            status: self.health.clone(),
            node_id: self.node_id.clone(),
        }
    }

    pub fn metrics(&self) -> &LedgerMetrics {
        &self.metrics
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Execute raw SQL, bypassing integrity checks. Test use only.
    #[doc(hidden)]
    pub fn __test_execute_raw_sql(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<usize> {
        Ok(self.conn.execute(sql, params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_db() -> PathBuf {
        std::env::temp_dir().join(format!("test_ledger_{}.db", uuid::Uuid::new_v4()))
    }

    fn append_n(ledger: &mut TransactionLedger, n: u64) {
        for i in 1..=n {
            let prev = ledger.latest_hash().unwrap();
            let entry = LedgerEntry::new(
                "owner",
                format!("payload-{}", i).into_bytes(),
                prev,
                1_700_000_000_000 + i,
            );
            assert_eq!(ledger.append_entry(entry).unwrap(), i);
        }
    }

    #[test]
    fn test_ledger_creation() {
        let db_path = temp_db();
        let ledger = TransactionLedger::open(&db_path, "test-node-1").unwrap();

        assert_eq!(ledger.node_id(), "test-node-1");
        assert!(ledger.get_ledger_health().status.is_ok());
        assert!(ledger.is_empty().unwrap());
        assert_eq!(ledger.latest_hash().unwrap(), GENESIS_HASH.to_vec());

        std::fs::remove_file(db_path).ok();
    }

    #[test]
    fn test_append_entries() {
        let db_path = temp_db();
        let mut ledger = TransactionLedger::open(&db_path, "test-node-1").unwrap();

        append_n(&mut ledger, 3);

        assert_eq!(ledger.len().unwrap(), 3);
        assert_eq!(ledger.metrics().ledger_entries_appended_total, 3);
        let (seq_no, latest) = ledger.get_latest_entry().unwrap().unwrap();
        assert_eq!(seq_no, 3);
        assert_eq!(latest.payload, b"payload-3".to_vec());

        std::fs::remove_file(db_path).ok();
    }

    #[test]
    fn test_append_rejects_wrong_prev_hash() {
        let db_path = temp_db();
        let mut ledger = TransactionLedger::open(&db_path, "test-node-1").unwrap();

        append_n(&mut ledger, 1);
        let entry = LedgerEntry::new("owner", b"x".to_vec(), vec![9u8; 32], 1);
        let result = ledger.append_entry(entry);

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::ChainOrderingViolation { .. }
        ));
        assert_eq!(ledger.len().unwrap(), 1);

        std::fs::remove_file(db_path).ok();
    }

    #[test]
    fn test_append_rejects_tampered_hash() {
        let db_path = temp_db();
        let mut ledger = TransactionLedger::open(&db_path, "test-node-1").unwrap();

        let mut entry = LedgerEntry::new("owner", b"x".to_vec(), GENESIS_HASH.to_vec(), 1);
        entry.payload = b"y".to_vec();

        assert!(matches!(
            ledger.append_entry(entry),
            Err(LedgerError::InvalidEntry(_))
        ));

        std::fs::remove_file(db_path).ok();
    }

    #[test]
    fn test_get_entry_by_seq_no() {
        let db_path = temp_db();
        let mut ledger = TransactionLedger::open(&db_path, "test-node-1").unwrap();

        append_n(&mut ledger, 2);

        assert_eq!(ledger.get_entry_by_seq_no(2).unwrap().payload, b"payload-2".to_vec());
        assert!(matches!(
            ledger.get_entry_by_seq_no(9),
            Err(LedgerError::EntryNotFound { seq_no: 9 })
        ));

        std::fs::remove_file(db_path).ok();
    }

    #[test]
    fn test_reopen_preserves_entries() {
        let db_path = temp_db();
        {
            let mut ledger = TransactionLedger::open(&db_path, "test-node-1").unwrap();
            append_n(&mut ledger, 4);
        }

        let ledger = TransactionLedger::open(&db_path, "test-node-1").unwrap();
        assert_eq!(ledger.len().unwrap(), 4);
        assert_eq!(ledger.metrics().ledger_startup_checks_total, 1);
        assert!(ledger.get_ledger_health().status.is_ok());

        std::fs::remove_file(db_path).ok();
    }

    #[test]
    fn test_continuity_check_detects_modified_payload() {
        let db_path = temp_db();
        {
            let mut ledger = TransactionLedger::open(&db_path, "test-node-1").unwrap();
            append_n(&mut ledger, 5);

            ledger
                .__test_execute_raw_sql(
                    "UPDATE ledger_transactions SET payload = ? WHERE seq_no = 3",
                    &[&b"forged".to_vec() as &dyn rusqlite::ToSql],
                )
                .unwrap();
        }

        let ledger = TransactionLedger::open(&db_path, "test-node-1");
        assert!(matches!(ledger, Err(LedgerError::CorruptionDetected(_))));

        std::fs::remove_file(db_path).ok();
    }
}
