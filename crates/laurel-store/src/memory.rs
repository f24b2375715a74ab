// crates/laurel-store/src/memory.rs
//
// In-memory ledger implementing the `LedgerStore` trait.
//
// All three tables live behind one lock, so a commit is atomic with respect
// to every other reader and writer in the process. Used by the daemon's
// `memory` backend and throughout the test suites.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use laurel_core::error::LaurelError;
use laurel_core::ids::{OwnerId, StakeKey, TokenId};
use laurel_core::receipt::SettlementReceipt;
use laurel_core::record::StakeRecord;
use laurel_core::traits::{LedgerStore, LedgerWrite};

#[derive(Debug, Default)]
struct Tables {
    /// Records grouped by owner, each owner's tokens in order, so listing
    /// one owner touches only that owner's records.
    records: BTreeMap<OwnerId, BTreeMap<TokenId, StakeRecord>>,
    stakers: HashMap<TokenId, OwnerId>,
    receipts: HashMap<String, SettlementReceipt>,
}

/// Process-local ledger with the same commit semantics as `RocksLedger`.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    tables: RwLock<Tables>,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stake records held.
    pub fn len(&self) -> usize {
        self.read()
            .map(|t| t.records.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, LaurelError> {
        self.tables
            .read()
            .map_err(|_| LaurelError::StoreUnavailable("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, LaurelError> {
        self.tables
            .write()
            .map_err(|_| LaurelError::StoreUnavailable("ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn get_record(&self, key: &StakeKey) -> Result<Option<StakeRecord>, LaurelError> {
        let tables = self.read()?;
        Ok(tables
            .records
            .get(&key.owner)
            .and_then(|tokens| tokens.get(&key.token))
            .cloned())
    }

    async fn commit(&self, write: LedgerWrite) -> Result<StakeRecord, LaurelError> {
        let next_revision = write.next_revision();
        let LedgerWrite {
            expected_revision,
            mut record,
            receipt,
        } = write;
        let key = record.key();
        let mut tables = self.write()?;

        // Validate everything before touching any table.
        let stored_revision = tables
            .records
            .get(&key.owner)
            .and_then(|tokens| tokens.get(&key.token))
            .map(|r| r.revision);
        if stored_revision != expected_revision {
            return Err(LaurelError::StoreConflict(format!(
                "record {} is at revision {:?}, expected {:?}",
                key, stored_revision, expected_revision
            )));
        }

        let holder = tables.stakers.get(&key.token).cloned();
        if record.is_staked() {
            if let Some(holder) = &holder {
                if holder != &key.owner {
                    return Err(LaurelError::AlreadyStaked(format!(
                        "token {} is staked by another owner",
                        key.token
                    )));
                }
            }
        }

        if let Some(receipt) = &receipt {
            if tables.receipts.contains_key(&receipt.dedup_key) {
                return Err(LaurelError::StoreConflict(format!(
                    "settlement {} already applied",
                    receipt.dedup_key
                )));
            }
        }

        record.revision = next_revision;
        if record.is_staked() {
            tables.stakers.insert(key.token.clone(), key.owner.clone());
        } else if holder.as_ref() == Some(&key.owner) {
            tables.stakers.remove(&key.token);
        }
        if let Some(receipt) = receipt {
            tables.receipts.insert(receipt.dedup_key.clone(), receipt);
        }
        tables
            .records
            .entry(key.owner.clone())
            .or_default()
            .insert(key.token.clone(), record.clone());

        Ok(record)
    }

    async fn staker_of(&self, token: &TokenId) -> Result<Option<OwnerId>, LaurelError> {
        Ok(self.read()?.stakers.get(token).cloned())
    }

    async fn records_for_owner(&self, owner: &OwnerId) -> Result<Vec<StakeRecord>, LaurelError> {
        let tables = self.read()?;
        Ok(tables
            .records
            .get(owner)
            .map(|tokens| tokens.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_receipt(&self, dedup_key: &str) -> Result<Option<SettlementReceipt>, LaurelError> {
        Ok(self.read()?.receipts.get(dedup_key).cloned())
    }
}
