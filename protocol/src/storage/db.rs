//! # LedgerDb: Persistent Storage
//!
//! Durable record of a ledger run, built on sled. The in-memory
//! [`crate::ledger::Ledger`] is authoritative while it runs; this store keeps
//! what it produced so a run can be inspected after the process exits.
//!
//! ## Tree Layout
//!
//! | Tree        | Key                  | Value                     |
//! |-------------|----------------------|---------------------------|
//! | `snapshots` | `round` (8B BE)      | `bincode(LedgerSnapshot)` |
//! | `receipts`  | `sequence` (8B BE)   | `bincode(GroupReceipt)`   |
//! | `metadata`  | key (UTF-8)          | value (bytes)             |
//!
//! Integer keys are big-endian so sled's lexicographic order is numeric
//! order, and the last entry of `snapshots` is the latest round.

use sled::{Db, Tree};
use std::path::Path;

use super::state::LedgerSnapshot;
use crate::ledger::GroupReceipt;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Metadata key holding the number of stored receipts.
const META_RECEIPT_COUNT: &[u8] = b"receipt_count";

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent store for ledger snapshots and group receipts.
///
/// sled trees are safe for concurrent use, so a `LedgerDb` can be cloned
/// or shared through an `Arc` without extra locking.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    snapshots: Tree,
    receipts: Tree,
    metadata: Tree,
}

impl LedgerDb {
    /// Open or create a database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// In-memory database removed on drop. For tests.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let snapshots = db.open_tree("snapshots")?;
        let receipts = db.open_tree("receipts")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self {
            db,
            snapshots,
            receipts,
            metadata,
        })
    }

    // -- Snapshots ----------------------------------------------------------

    /// Store a snapshot under its round, replacing any earlier one.
    pub fn put_snapshot(&self, snapshot: &LedgerSnapshot) -> DbResult<()> {
        let bytes = encode(snapshot)?;
        self.snapshots.insert(snapshot.round.to_be_bytes(), bytes)?;
        Ok(())
    }

    /// Snapshot stored for exactly `round`.
    pub fn snapshot_at(&self, round: u64) -> DbResult<Option<LedgerSnapshot>> {
        match self.snapshots.get(round.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Snapshot with the highest round.
    pub fn latest_snapshot(&self) -> DbResult<Option<LedgerSnapshot>> {
        match self.snapshots.last()? {
            Some((_, bytes)) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of stored snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    // -- Receipts -----------------------------------------------------------

    /// Append a receipt. Returns its sequence number (0-based).
    pub fn append_receipt(&self, receipt: &GroupReceipt) -> DbResult<u64> {
        let sequence = self.receipt_count()?;
        let bytes = encode(receipt)?;
        self.receipts.insert(sequence.to_be_bytes(), bytes)?;
        self.metadata
            .insert(META_RECEIPT_COUNT, &(sequence + 1).to_be_bytes())?;
        Ok(sequence)
    }

    /// All receipts in commit order.
    pub fn receipts(&self) -> DbResult<Vec<GroupReceipt>> {
        self.receipts
            .iter()
            .map(|entry| {
                let (_, bytes) = entry?;
                decode(&bytes)
            })
            .collect()
    }

    /// Number of stored receipts.
    pub fn receipt_count(&self) -> DbResult<u64> {
        match self.metadata.get(META_RECEIPT_COUNT)? {
            Some(bytes) if bytes.len() == 8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes);
                Ok(u64::from_be_bytes(buf))
            }
            _ => Ok(0),
        }
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn encode<T: serde::Serialize>(value: &T) -> DbResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Address;
    use crate::storage::state::{AccountState, ApplicationSnapshot, GlobalState, StateSchema};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn snapshot(round: u64) -> LedgerSnapshot {
        let mut accounts = BTreeMap::new();
        accounts.insert(Address::derive(b"alice"), AccountState::with_balance(round * 10));

        let mut state = GlobalState::new(StateSchema::new(3, 4));
        state.write_uint("HighestBid", round).unwrap();
        let mut applications = BTreeMap::new();
        applications.insert(
            7,
            ApplicationSnapshot {
                name: "auction".into(),
                creator: Address::derive(b"alice"),
                state,
            },
        );

        LedgerSnapshot {
            round,
            accounts,
            assets: BTreeMap::new(),
            applications,
        }
    }

    fn receipt(round: u64) -> GroupReceipt {
        GroupReceipt {
            group_id: hex::encode([round as u8; 32]),
            round,
            txn_ids: vec!["ab".repeat(32)],
            committed_at: Utc::now(),
            app_state_versions: BTreeMap::from([(7, round)]),
        }
    }

    #[test]
    fn open_temporary_database() {
        let db = LedgerDb::open_temporary().expect("should create temp db");
        assert_eq!(db.snapshot_count(), 0);
        assert_eq!(db.receipt_count().unwrap(), 0);
        assert!(db.latest_snapshot().unwrap().is_none());
    }

    #[test]
    fn latest_snapshot_is_highest_round() {
        let db = LedgerDb::open_temporary().unwrap();
        db.put_snapshot(&snapshot(300)).unwrap();
        db.put_snapshot(&snapshot(20)).unwrap();
        db.put_snapshot(&snapshot(256)).unwrap();

        let latest = db.latest_snapshot().unwrap().unwrap();
        assert_eq!(latest.round, 300);
        assert_eq!(db.snapshot_count(), 3);
        assert_eq!(
            db.snapshot_at(20)
                .unwrap()
                .unwrap()
                .global_state(7)
                .unwrap()
                .read_uint("HighestBid")
                .unwrap(),
            Some(20)
        );
        assert!(db.snapshot_at(21).unwrap().is_none());
    }

    #[test]
    fn receipts_keep_commit_order() {
        let db = LedgerDb::open_temporary().unwrap();
        for round in [120, 130, 260] {
            db.append_receipt(&receipt(round)).unwrap();
        }
        let rounds: Vec<u64> = db.receipts().unwrap().iter().map(|r| r.round).collect();
        assert_eq!(rounds, vec![120, 130, 260]);
        assert_eq!(db.receipt_count().unwrap(), 3);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let db = LedgerDb::open(dir.path()).expect("should open db");
            db.put_snapshot(&snapshot(42)).unwrap();
            db.append_receipt(&receipt(42)).unwrap();
            db.flush().unwrap();
        }

        let db = LedgerDb::open(dir.path()).expect("should reopen db");
        let latest = db.latest_snapshot().unwrap().unwrap();
        assert_eq!(latest, snapshot(42));
        assert_eq!(db.receipts().unwrap().len(), 1);
    }
}
