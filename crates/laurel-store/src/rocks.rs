// crates/laurel-store/src/rocks.rs
//
// RocksDB-backed persistent ledger for stake records.
//
// Key format:
//   - Record:   `stake:{owner}:{token}` -> JSON-serialized StakeRecord
//   - Index:    `staked:{token}`        -> owner id of the current staker
//   - Receipt:  `receipt:{dedup_key}`   -> JSON-serialized SettlementReceipt
//
// Owner and token ids never contain ':', so `stake:{owner}:` is an exact
// prefix for listing an owner's records.
//
// Commits run inside an optimistic transaction. Every key the commit depends
// on is read with `get_for_update`, so a concurrent writer that touches the
// same record or token index between our read and our commit makes the
// commit fail with `Busy`, which surfaces as `StoreConflict`.

use async_trait::async_trait;
use rocksdb::{ErrorKind, MultiThreaded, OptimisticTransactionDB, Options};

use laurel_core::error::LaurelError;
use laurel_core::ids::{OwnerId, StakeKey, TokenId};
use laurel_core::receipt::SettlementReceipt;
use laurel_core::record::StakeRecord;
use laurel_core::traits::{LedgerStore, LedgerWrite};

/// RocksDB wrapper implementing the `LedgerStore` trait.
pub struct RocksLedger {
    db: OptimisticTransactionDB<MultiThreaded>,
    path: String,
}

impl std::fmt::Debug for RocksLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksLedger").field("path", &self.path).finish()
    }
}

/// Map a RocksDB error into the taxonomy. Lost optimistic races become
/// `StoreConflict`; everything else means the store is not usable.
fn map_rocks_err(context: &str, e: rocksdb::Error) -> LaurelError {
    match e.kind() {
        ErrorKind::Busy | ErrorKind::TryAgain => {
            LaurelError::StoreConflict(format!("{}: {}", context, e))
        }
        _ => LaurelError::StoreUnavailable(format!("{}: {}", context, e)),
    }
}

impl RocksLedger {
    /// Open a RocksDB ledger at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, LaurelError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = OptimisticTransactionDB::<MultiThreaded>::open(&opts, path).map_err(|e| {
            LaurelError::StoreUnavailable(format!("Failed to open RocksDB at {}: {}", path, e))
        })?;

        tracing::debug!("Opened ledger at {}", path);
        Ok(Self {
            db,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn record_key(key: &StakeKey) -> Vec<u8> {
        format!("stake:{}:{}", key.owner, key.token).into_bytes()
    }

    fn owner_prefix(owner: &OwnerId) -> Vec<u8> {
        format!("stake:{}:", owner).into_bytes()
    }

    fn token_index_key(token: &TokenId) -> Vec<u8> {
        format!("staked:{}", token).into_bytes()
    }

    fn receipt_key(dedup_key: &str) -> Vec<u8> {
        format!("receipt:{}", dedup_key).into_bytes()
    }

    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LaurelError> {
        self.db
            .get(key)
            .map_err(|e| map_rocks_err("RocksDB get failed", e))
    }

    fn decode_record(bytes: &[u8]) -> Result<StakeRecord, LaurelError> {
        let record: StakeRecord = serde_json::from_slice(bytes)?;
        record.check_invariants()?;
        Ok(record)
    }

    fn decode_owner(bytes: Vec<u8>) -> Result<OwnerId, LaurelError> {
        let raw = String::from_utf8(bytes)
            .map_err(|e| LaurelError::Serialization(format!("token index not UTF-8: {}", e)))?;
        OwnerId::parse(&raw)
    }

    /// Synchronous record lookup.
    pub fn get_record_sync(&self, key: &StakeKey) -> Result<Option<StakeRecord>, LaurelError> {
        match self.get_raw(&Self::record_key(key))? {
            Some(bytes) => Ok(Some(Self::decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Synchronous compare-and-swap commit. See `LedgerWrite` for the rules.
    pub fn commit_sync(&self, write: LedgerWrite) -> Result<StakeRecord, LaurelError> {
        let next_revision = write.next_revision();
        let LedgerWrite {
            expected_revision,
            mut record,
            receipt,
        } = write;
        let key = record.key();
        let record_key = Self::record_key(&key);
        let index_key = Self::token_index_key(&key.token);

        // Dropping `txn` without commit rolls everything back.
        let txn = self.db.transaction();

        let stored_revision = match txn
            .get_for_update(&record_key, true)
            .map_err(|e| map_rocks_err("RocksDB read-for-update failed", e))?
        {
            Some(bytes) => Some(Self::decode_record(&bytes)?.revision),
            None => None,
        };
        if stored_revision != expected_revision {
            return Err(LaurelError::StoreConflict(format!(
                "record {} is at revision {:?}, expected {:?}",
                key, stored_revision, expected_revision
            )));
        }

        let holder = txn
            .get_for_update(&index_key, true)
            .map_err(|e| map_rocks_err("RocksDB read-for-update failed", e))?
            .map(Self::decode_owner)
            .transpose()?;

        record.revision = next_revision;

        if record.is_staked() {
            if let Some(holder) = &holder {
                if holder != &key.owner {
                    return Err(LaurelError::AlreadyStaked(format!(
                        "token {} is staked by another owner",
                        key.token
                    )));
                }
            }
            txn.put(&index_key, key.owner.as_str().as_bytes())
                .map_err(|e| map_rocks_err("RocksDB put failed", e))?;
        } else if holder.as_ref() == Some(&key.owner) {
            txn.delete(&index_key)
                .map_err(|e| map_rocks_err("RocksDB delete failed", e))?;
        }

        let json = serde_json::to_vec(&record)?;
        txn.put(&record_key, &json)
            .map_err(|e| map_rocks_err("RocksDB put failed", e))?;

        if let Some(receipt) = &receipt {
            let receipt_key = Self::receipt_key(&receipt.dedup_key);
            let existing = txn
                .get_for_update(&receipt_key, true)
                .map_err(|e| map_rocks_err("RocksDB read-for-update failed", e))?;
            if existing.is_some() {
                return Err(LaurelError::StoreConflict(format!(
                    "settlement {} already applied",
                    receipt.dedup_key
                )));
            }
            let json = serde_json::to_vec(receipt)?;
            txn.put(&receipt_key, &json)
                .map_err(|e| map_rocks_err("RocksDB put failed", e))?;
        }

        txn.commit()
            .map_err(|e| map_rocks_err("RocksDB commit failed", e))?;

        tracing::debug!(
            "Committed {} at revision {} ({})",
            key,
            record.revision,
            record.status
        );
        Ok(record)
    }

    /// Synchronous listing of an owner's records.
    pub fn records_for_owner_sync(&self, owner: &OwnerId) -> Result<Vec<StakeRecord>, LaurelError> {
        let prefix = Self::owner_prefix(owner);
        let mut records = Vec::new();

        for item in self.db.prefix_iterator(&prefix) {
            let (key, value) =
                item.map_err(|e| map_rocks_err("RocksDB iteration error", e))?;

            // Iteration continues past the prefix without an extractor; stop there.
            if !key.starts_with(&prefix) {
                break;
            }
            records.push(Self::decode_record(&value)?);
        }

        Ok(records)
    }
}

#[async_trait]
impl LedgerStore for RocksLedger {
    async fn get_record(&self, key: &StakeKey) -> Result<Option<StakeRecord>, LaurelError> {
        self.get_record_sync(key)
    }

    async fn commit(&self, write: LedgerWrite) -> Result<StakeRecord, LaurelError> {
        self.commit_sync(write)
    }

    async fn staker_of(&self, token: &TokenId) -> Result<Option<OwnerId>, LaurelError> {
        self.get_raw(&Self::token_index_key(token))?
            .map(Self::decode_owner)
            .transpose()
    }

    async fn records_for_owner(&self, owner: &OwnerId) -> Result<Vec<StakeRecord>, LaurelError> {
        self.records_for_owner_sync(owner)
    }

    async fn get_receipt(&self, dedup_key: &str) -> Result<Option<SettlementReceipt>, LaurelError> {
        match self.get_raw(&Self::receipt_key(dedup_key))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laurel_core::receipt::dedup_key;
    use laurel_core::record::StakeStatus;
    use laurel_core::time::Timestamp;

    fn temp_db_path(label: &str) -> String {
        let path = std::env::temp_dir().join(format!("laurel_test_{}_{}", label, uuid::Uuid::now_v7()));
        path.to_string_lossy().to_string()
    }

    fn key(owner: &str, token: &str) -> StakeKey {
        StakeKey::parse(owner, token).unwrap()
    }

    fn create(ledger: &RocksLedger, k: &StakeKey, at: u64) -> StakeRecord {
        ledger
            .commit_sync(LedgerWrite {
                expected_revision: None,
                record: StakeRecord::open(k, Timestamp::new(at)),
                receipt: None,
            })
            .unwrap()
    }

    #[test]
    fn test_create_and_read_back() {
        let ledger = RocksLedger::open(&temp_db_path("create")).unwrap();
        let k = key("0xa", "1");
        let committed = create(&ledger, &k, 100);
        assert_eq!(committed.revision, 0);

        let loaded = ledger.get_record_sync(&k).unwrap().unwrap();
        assert_eq!(loaded, committed);
    }

    #[test]
    fn test_interleaved_transaction_loses_with_conflict() {
        let ledger = RocksLedger::open(&temp_db_path("interleave")).unwrap();
        let k = key("0xa", "1");
        let opened = create(&ledger, &k, 100);
        let record_key = RocksLedger::record_key(&k);

        // A transaction reads the record, then another writer commits first.
        let held = ledger.db.transaction();
        held.get_for_update(&record_key, true).unwrap();

        let mut bumped = opened.clone();
        bumped.accrued_points_balance = 3;
        ledger
            .commit_sync(LedgerWrite {
                expected_revision: Some(0),
                record: bumped,
                receipt: None,
            })
            .unwrap();

        let mut stale = opened;
        stale.accrued_points_balance = 99;
        held.put(&record_key, serde_json::to_vec(&stale).unwrap())
            .unwrap();
        let err = held.commit().unwrap_err();
        assert!(matches!(
            map_rocks_err("commit", err),
            LaurelError::StoreConflict(_)
        ));

        let stored = ledger.get_record_sync(&k).unwrap().unwrap();
        assert_eq!(stored.accrued_points_balance, 3);
        assert_eq!(stored.revision, 1);
    }

    #[test]
    fn test_racing_commits_on_one_revision_have_one_winner() {
        use std::sync::{Arc, Barrier};

        let ledger = Arc::new(RocksLedger::open(&temp_db_path("race")).unwrap());
        let k = key("0xa", "1");
        let mut current = create(&ledger, &k, 100);

        for round in 0..20u64 {
            let barrier = Arc::new(Barrier::new(4));
            let handles: Vec<_> = (0..4u64)
                .map(|writer| {
                    let ledger = ledger.clone();
                    let barrier = barrier.clone();
                    let mut next = current.clone();
                    next.accrued_points_balance = round * 10 + writer;
                    let expected = current.revision;
                    std::thread::spawn(move || {
                        barrier.wait();
                        ledger.commit_sync(LedgerWrite {
                            expected_revision: Some(expected),
                            record: next,
                            receipt: None,
                        })
                    })
                })
                .collect();

            let mut winners = Vec::new();
            for handle in handles {
                match handle.join().unwrap() {
                    Ok(record) => winners.push(record),
                    Err(e) => assert_eq!(e.kind(), "StoreConflict"),
                }
            }
            assert_eq!(winners.len(), 1, "round {}", round);
            current = ledger.get_record_sync(&k).unwrap().unwrap();
            assert_eq!(current, winners[0]);
            assert_eq!(current.revision, round + 1);
        }
    }

    #[test]
    fn test_stale_revision_conflicts() {
        let ledger = RocksLedger::open(&temp_db_path("stale")).unwrap();
        let k = key("0xa", "1");
        create(&ledger, &k, 100);

        // A second creation expects no record and must lose.
        let err = ledger
            .commit_sync(LedgerWrite {
                expected_revision: None,
                record: StakeRecord::open(&k, Timestamp::new(200)),
                receipt: None,
            })
            .unwrap_err();
        assert_eq!(err.kind(), "StoreConflict");
    }

    #[test]
    fn test_token_held_by_other_owner() {
        let ledger = RocksLedger::open(&temp_db_path("exclusive")).unwrap();
        create(&ledger, &key("0xa", "1"), 100);

        let err = ledger
            .commit_sync(LedgerWrite {
                expected_revision: None,
                record: StakeRecord::open(&key("0xb", "1"), Timestamp::new(100)),
                receipt: None,
            })
            .unwrap_err();
        assert_eq!(err.kind(), "AlreadyStaked");
        assert!(ledger.get_record_sync(&key("0xb", "1")).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unstake_releases_token_index() {
        let ledger = RocksLedger::open(&temp_db_path("release")).unwrap();
        let k = key("0xa", "1");
        let mut rec = create(&ledger, &k, 100);
        assert_eq!(ledger.staker_of(&k.token).await.unwrap(), Some(k.owner.clone()));

        rec.status = StakeStatus::Unstaked;
        rec.staked_at = None;
        ledger
            .commit(LedgerWrite {
                expected_revision: Some(0),
                record: rec,
                receipt: None,
            })
            .await
            .unwrap();
        assert_eq!(ledger.staker_of(&k.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_receipt_is_written_once() {
        let ledger = RocksLedger::open(&temp_db_path("receipt")).unwrap();
        let k = key("0xa", "1");
        let rec = create(&ledger, &k, 0);

        let receipt = SettlementReceipt {
            dedup_key: dedup_key(&k.owner, &k.token, Timestamp::new(0), 0),
            command_id: uuid::Uuid::now_v7(),
            owner: k.owner.clone(),
            token: k.token.clone(),
            points_awarded: 1,
            new_balance: 1,
            window_start: Timestamp::new(0),
            new_last_settled_at: Timestamp::new(28_800),
            settled_at: Timestamp::new(43_200),
        };
        let mut next = rec.clone();
        next.accrued_points_balance = 1;
        next.last_settled_at = Timestamp::new(28_800);
        ledger
            .commit(LedgerWrite {
                expected_revision: Some(0),
                record: next.clone(),
                receipt: Some(receipt.clone()),
            })
            .await
            .unwrap();

        let stored = ledger.get_receipt(&receipt.dedup_key).await.unwrap();
        assert_eq!(stored, Some(receipt.clone()));

        // Replaying the same settlement is rejected even at the right revision.
        let err = ledger
            .commit(LedgerWrite {
                expected_revision: Some(1),
                record: next,
                receipt: Some(receipt),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "StoreConflict");
        let rec = ledger.get_record_sync(&k).unwrap().unwrap();
        assert_eq!(rec.revision, 1);
        assert_eq!(rec.accrued_points_balance, 1);
    }

    #[tokio::test]
    async fn test_records_for_owner_prefix_is_exact() {
        let ledger = RocksLedger::open(&temp_db_path("prefix")).unwrap();
        create(&ledger, &key("0xa", "1"), 0);
        create(&ledger, &key("0xa", "2"), 0);
        create(&ledger, &key("0xab", "3"), 0);

        let owner = OwnerId::parse("0xa").unwrap();
        let records = ledger.records_for_owner(&owner).await.unwrap();
        let tokens: Vec<&str> = records.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(tokens, vec!["1", "2"]);
    }
}
