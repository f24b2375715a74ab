// crates/laurel-core/src/traits.rs

use async_trait::async_trait;

use crate::error::LaurelError;
use crate::ids::{OwnerId, StakeKey, TokenId};
use crate::receipt::SettlementReceipt;
use crate::record::StakeRecord;

/// A single compare-and-swap write against the ledger.
///
/// The store applies the whole write atomically or not at all:
///   1. The stored revision for `record.key()` must equal `expected_revision`
///      (`None` means no record may exist yet), else `StoreConflict`.
///   2. If `record` is Staked, the token must not be staked by another
///      owner, else `AlreadyStaked`.
///   3. The record is stored with `revision = expected_revision + 1`
///      (or 0 on creation), the token index is updated, and the receipt, if
///      any, is stored under its dedup key.
#[derive(Debug, Clone)]
pub struct LedgerWrite {
    pub expected_revision: Option<u64>,
    pub record: StakeRecord,
    pub receipt: Option<SettlementReceipt>,
}

impl LedgerWrite {
    /// The revision the record will carry once committed.
    pub fn next_revision(&self) -> u64 {
        self.expected_revision.map_or(0, |r| r + 1)
    }
}

/// Trait for durable stake ledger storage.
///
/// Implemented by laurel-store (RocksDB and in-memory backends). A proxy
/// over a remote ledger implements `commit` as an idempotent command keyed by
/// the receipt's dedup key.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the record for an (owner, token) pair.
    async fn get_record(&self, key: &StakeKey) -> Result<Option<StakeRecord>, LaurelError>;

    /// Atomically apply a compare-and-swap write. Returns the committed record.
    async fn commit(&self, write: LedgerWrite) -> Result<StakeRecord, LaurelError>;

    /// Which owner currently has the token staked, if any.
    async fn staker_of(&self, token: &TokenId) -> Result<Option<OwnerId>, LaurelError>;

    /// All records (staked or not) belonging to an owner, ordered by token id.
    async fn records_for_owner(&self, owner: &OwnerId) -> Result<Vec<StakeRecord>, LaurelError>;

    /// Look up a settlement receipt by its dedup key.
    async fn get_receipt(&self, dedup_key: &str) -> Result<Option<SettlementReceipt>, LaurelError>;
}

/// Trait for the external ownership-verification collaborator.
///
/// Treated as authoritative and possibly slow. Called before any ledger write.
#[async_trait]
pub trait OwnershipVerifier: Send + Sync {
    /// Returns `true` if `owner` currently owns `token`.
    async fn is_owner(&self, owner: &OwnerId, token: &TokenId) -> Result<bool, LaurelError>;
}
