// crates/laurel-core/src/record.rs
//
// StakeRecord: the per-(owner, token) staking state.
//
// Lifecycle:
//   (none) --stake--> Staked --unstake--> Unstaked --stake--> Staked ...
//
// Records are never deleted. An Unstaked record keeps its settled balance
// for audit, and a later Stake re-opens a fresh accrual window on it.
//
// The settled instant is `last_settled_at + settled_remainder / rate_per_day`
// seconds. `settled_remainder` carries the sub-second part of the time that
// has already been paid so that settlement can advance by exactly
// `points * one_day / rate_per_day` for any rate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LaurelError;
use crate::ids::{OwnerId, StakeKey, TokenId};
use crate::time::Timestamp;

/// Staking status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakeStatus {
    Unstaked,
    Staked,
}

impl fmt::Display for StakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakeStatus::Unstaked => write!(f, "Unstaked"),
            StakeStatus::Staked => write!(f, "Staked"),
        }
    }
}

/// Persistent staking state for one (owner, token) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRecord {
    /// The staking party.
    pub owner: OwnerId,
    /// The staked badge token.
    pub token: TokenId,
    pub status: StakeStatus,
    /// Time of the most recent Stake transition. `None` while Unstaked.
    pub staked_at: Option<Timestamp>,
    /// Whole seconds through which points have been paid.
    pub last_settled_at: Timestamp,
    /// Sub-second paid time in units of `1 / rate_per_day` seconds.
    #[serde(default)]
    pub settled_remainder: u64,
    /// Cumulative settled points. Never decreases.
    pub accrued_points_balance: u64,
    /// Optimistic-concurrency version; bumped on every committed write.
    pub revision: u64,
}

impl StakeRecord {
    /// A freshly staked record for a pair that has never been staked.
    pub fn open(key: &StakeKey, now: Timestamp) -> Self {
        Self {
            owner: key.owner.clone(),
            token: key.token.clone(),
            status: StakeStatus::Staked,
            staked_at: Some(now),
            last_settled_at: now,
            settled_remainder: 0,
            accrued_points_balance: 0,
            revision: 0,
        }
    }

    pub fn key(&self) -> StakeKey {
        StakeKey::new(self.owner.clone(), self.token.clone())
    }

    pub fn is_staked(&self) -> bool {
        self.status == StakeStatus::Staked
    }

    /// Check the structural invariants that hold regardless of the clock.
    ///
    /// # Errors
    /// Returns `LaurelError::Serialization` describing the violated invariant;
    /// a record that fails this check was corrupted at rest.
    pub fn check_invariants(&self) -> Result<(), LaurelError> {
        match (self.status, self.staked_at) {
            (StakeStatus::Staked, None) => {
                return Err(LaurelError::Serialization(format!(
                    "record {} is Staked without stakedAt",
                    self.key()
                )))
            }
            (StakeStatus::Unstaked, Some(_)) => {
                return Err(LaurelError::Serialization(format!(
                    "record {} is Unstaked with stakedAt set",
                    self.key()
                )))
            }
            _ => {}
        }

        if let Some(staked_at) = self.staked_at {
            if self.last_settled_at < staked_at {
                return Err(LaurelError::Serialization(format!(
                    "record {} settled at {} before staking at {}",
                    self.key(),
                    self.last_settled_at,
                    staked_at
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> StakeKey {
        StakeKey::parse("0xowner", "7").unwrap()
    }

    #[test]
    fn test_open_record() {
        let rec = StakeRecord::open(&key(), Timestamp::new(100));
        assert!(rec.is_staked());
        assert_eq!(rec.staked_at, Some(Timestamp::new(100)));
        assert_eq!(rec.last_settled_at, Timestamp::new(100));
        assert_eq!(rec.accrued_points_balance, 0);
        assert_eq!(rec.revision, 0);
        assert!(rec.check_invariants().is_ok());
    }

    #[test]
    fn test_staked_without_staked_at_is_invalid() {
        let mut rec = StakeRecord::open(&key(), Timestamp::new(100));
        rec.staked_at = None;
        assert!(rec.check_invariants().is_err());
    }

    #[test]
    fn test_unstaked_with_staked_at_is_invalid() {
        let mut rec = StakeRecord::open(&key(), Timestamp::new(100));
        rec.status = StakeStatus::Unstaked;
        assert!(rec.check_invariants().is_err());
    }

    #[test]
    fn test_settled_before_stake_is_invalid() {
        let mut rec = StakeRecord::open(&key(), Timestamp::new(100));
        rec.last_settled_at = Timestamp::new(99);
        assert!(rec.check_invariants().is_err());
    }

    #[test]
    fn test_json_roundtrip_defaults_remainder() {
        let rec = StakeRecord::open(&key(), Timestamp::new(5));
        let mut value = serde_json::to_value(&rec).unwrap();
        value.as_object_mut().unwrap().remove("settledRemainder");
        let back: StakeRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, rec);
    }
}
