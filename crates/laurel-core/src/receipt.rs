// crates/laurel-core/src/receipt.rs
//
// Settlement receipts: the audit trail of every settlement that paid points.
//
// A receipt is keyed by a deduplication key derived from the pair and the
// settled instant *before* the settlement. Two settlements can only share a
// key if they started from the same window, so a store that already holds a
// receipt for a key has already applied that settlement. This is what makes a
// settlement an idempotent command when the ledger sits behind a proxy.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::ids::{OwnerId, TokenId};
use crate::time::Timestamp;

/// Compute the deduplication key for a settlement starting at the given
/// settled instant. Hex-encoded SHA-256.
pub fn dedup_key(
    owner: &OwnerId,
    token: &TokenId,
    last_settled_at: Timestamp,
    settled_remainder: u64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(token.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(last_settled_at.as_secs().to_be_bytes());
    hasher.update(settled_remainder.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Immutable record of one committed settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub dedup_key: String,
    /// Identifies the command that committed this settlement. A command that
    /// finds its own id here after a failed commit knows the commit landed.
    pub command_id: Uuid,
    pub owner: OwnerId,
    pub token: TokenId,
    pub points_awarded: u64,
    /// Balance after this settlement.
    pub new_balance: u64,
    /// `last_settled_at` before the settlement.
    pub window_start: Timestamp,
    pub new_last_settled_at: Timestamp,
    /// The instant the settlement was computed for.
    pub settled_at: Timestamp,
}
