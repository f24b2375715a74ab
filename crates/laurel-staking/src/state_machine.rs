// crates/laurel-staking/src/state_machine.rs
//
// Staking state machine: the per-(owner, token) transitions
//
//   (none) | Unstaked --Stake--> Staked
//   Staked --Unstake--> Unstaked     (settles first)
//   Staked --Claim-->   Staked       (settles; zero points is an error)
//
// Every function here is pure: it takes the record as currently stored and
// the instant to evaluate at, and returns the record to write plus the
// compare-and-swap guard for writing it. The settlement engine owns the
// read and the commit, and re-plans on every retry.

use laurel_core::error::LaurelError;
use laurel_core::ids::StakeKey;
use laurel_core::record::{StakeRecord, StakeStatus};
use laurel_core::time::Timestamp;
use laurel_core::traits::LedgerWrite;

use crate::accrual::AccrualPolicy;
use crate::settlement::{compute_settlement, Settlement};

/// The result of planning one transition.
#[derive(Debug, Clone)]
pub struct Plan {
    /// The record as it will look after the write (or as it is, if `write`
    /// is `None`).
    pub next: StakeRecord,
    /// The write to commit. `None` means the transition is a no-op.
    pub write: Option<LedgerWrite>,
    pub settlement: Settlement,
}

impl Plan {
    fn unchanged(record: StakeRecord) -> Self {
        let settlement = Settlement::none(&record);
        Self {
            next: record,
            write: None,
            settlement,
        }
    }

    fn commit(current: Option<&StakeRecord>, next: StakeRecord, settlement: Settlement) -> Self {
        let write = LedgerWrite {
            expected_revision: current.map(|r| r.revision),
            record: next.clone(),
            receipt: settlement.receipt.clone(),
        };
        Self {
            next,
            write: Some(write),
            settlement,
        }
    }
}

fn require_staked(current: Option<StakeRecord>, key: &StakeKey) -> Result<StakeRecord, LaurelError> {
    match current {
        Some(record) if record.is_staked() => Ok(record),
        _ => Err(LaurelError::NotStaked(format!("{} is not staked", key))),
    }
}

/// Open an accrual window at `now`.
///
/// A previously unstaked record keeps its balance; its staking time and
/// settled instant are reset so nothing accrues for the time it sat unstaked.
pub fn plan_stake(
    current: Option<StakeRecord>,
    key: &StakeKey,
    now: Timestamp,
) -> Result<Plan, LaurelError> {
    match current {
        Some(record) if record.is_staked() => Err(LaurelError::AlreadyStaked(format!(
            "{} has been staked since {}",
            key,
            record.staked_at.unwrap_or(record.last_settled_at)
        ))),
        Some(record) => {
            let mut next = record.clone();
            next.status = StakeStatus::Staked;
            next.staked_at = Some(now);
            next.last_settled_at = now;
            next.settled_remainder = 0;
            let settlement = Settlement::none(&next);
            Ok(Plan::commit(Some(&record), next, settlement))
        }
        None => {
            let next = StakeRecord::open(key, now);
            let settlement = Settlement::none(&next);
            Ok(Plan::commit(None, next, settlement))
        }
    }
}

/// Settle up to `now`, then close the accrual window.
///
/// Time past the last whole point is not paid.
pub fn plan_unstake(
    current: Option<StakeRecord>,
    key: &StakeKey,
    now: Timestamp,
    policy: &AccrualPolicy,
) -> Result<Plan, LaurelError> {
    let record = require_staked(current, key)?;
    let settlement = compute_settlement(&record, now, policy);

    let mut next = record.clone();
    settlement.apply_to(&mut next);
    next.status = StakeStatus::Unstaked;
    next.staked_at = None;

    Ok(Plan::commit(Some(&record), next, settlement))
}

/// Settle up to `now` without changing status.
///
/// # Errors
/// `NoPendingPoints` if nothing whole has accrued yet.
pub fn plan_claim(
    current: Option<StakeRecord>,
    key: &StakeKey,
    now: Timestamp,
    policy: &AccrualPolicy,
) -> Result<Plan, LaurelError> {
    let record = require_staked(current, key)?;
    let settlement = compute_settlement(&record, now, policy);
    if settlement.points_awarded == 0 {
        return Err(LaurelError::NoPendingPoints(format!(
            "{} has accrued no whole points since {}",
            key, record.last_settled_at
        )));
    }

    let mut next = record.clone();
    settlement.apply_to(&mut next);
    Ok(Plan::commit(Some(&record), next, settlement))
}

/// Settle up to `as_of`. Zero points is a no-op, not an error.
pub fn plan_settle(
    current: Option<StakeRecord>,
    key: &StakeKey,
    as_of: Timestamp,
    policy: &AccrualPolicy,
) -> Result<Plan, LaurelError> {
    let record = require_staked(current, key)?;
    let settlement = compute_settlement(&record, as_of, policy);
    if settlement.points_awarded == 0 {
        return Ok(Plan::unchanged(record));
    }

    let mut next = record.clone();
    settlement.apply_to(&mut next);
    Ok(Plan::commit(Some(&record), next, settlement))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: u64 = 86_400;

    fn key() -> StakeKey {
        StakeKey::parse("0xowner", "42").unwrap()
    }

    fn policy() -> AccrualPolicy {
        AccrualPolicy {
            rate_per_day: 3,
            one_day_secs: DAY,
        }
    }

    fn staked_at(t: u64) -> StakeRecord {
        let mut rec = StakeRecord::open(&key(), Timestamp::new(t));
        rec.revision = 4;
        rec
    }

    #[test]
    fn test_stake_creates_record() {
        let plan = plan_stake(None, &key(), Timestamp::new(10)).unwrap();
        let write = plan.write.unwrap();
        assert_eq!(write.expected_revision, None);
        assert_eq!(write.record.staked_at, Some(Timestamp::new(10)));
        assert!(write.receipt.is_none());
    }

    #[test]
    fn test_stake_while_staked_fails() {
        let err = plan_stake(Some(staked_at(0)), &key(), Timestamp::new(10)).unwrap_err();
        assert!(matches!(err, LaurelError::AlreadyStaked(_)));
    }

    #[test]
    fn test_restake_keeps_balance_and_resets_window() {
        let mut rec = staked_at(0);
        rec.status = StakeStatus::Unstaked;
        rec.staked_at = None;
        rec.accrued_points_balance = 9;
        rec.last_settled_at = Timestamp::new(DAY);
        rec.settled_remainder = 2;

        let plan = plan_stake(Some(rec), &key(), Timestamp::new(DAY * 5)).unwrap();
        let write = plan.write.unwrap();
        assert_eq!(write.expected_revision, Some(4));
        assert_eq!(write.record.accrued_points_balance, 9);
        assert_eq!(write.record.staked_at, Some(Timestamp::new(DAY * 5)));
        assert_eq!(write.record.last_settled_at, Timestamp::new(DAY * 5));
        assert_eq!(write.record.settled_remainder, 0);
    }

    #[test]
    fn test_unstake_settles_then_closes() {
        let plan = plan_unstake(Some(staked_at(0)), &key(), Timestamp::new(DAY), &policy()).unwrap();
        assert_eq!(plan.settlement.points_awarded, 3);
        let write = plan.write.unwrap();
        assert_eq!(write.record.status, StakeStatus::Unstaked);
        assert_eq!(write.record.staked_at, None);
        assert_eq!(write.record.accrued_points_balance, 3);
        assert!(write.receipt.is_some());
    }

    #[test]
    fn test_unstake_with_nothing_accrued_still_closes() {
        let plan = plan_unstake(Some(staked_at(0)), &key(), Timestamp::new(60), &policy()).unwrap();
        assert_eq!(plan.settlement.points_awarded, 0);
        let write = plan.write.unwrap();
        assert_eq!(write.record.status, StakeStatus::Unstaked);
        assert!(write.receipt.is_none());
    }

    #[test]
    fn test_unstake_without_record_fails() {
        let err = plan_unstake(None, &key(), Timestamp::new(60), &policy()).unwrap_err();
        assert!(matches!(err, LaurelError::NotStaked(_)));
    }

    #[test]
    fn test_claim_zero_points_fails() {
        let err = plan_claim(Some(staked_at(0)), &key(), Timestamp::new(100), &policy()).unwrap_err();
        assert!(matches!(err, LaurelError::NoPendingPoints(_)));
    }

    #[test]
    fn test_claim_advances_by_paid_time_only() {
        let plan = plan_claim(Some(staked_at(0)), &key(), Timestamp::new(43_200), &policy()).unwrap();
        assert_eq!(plan.settlement.points_awarded, 1);
        assert_eq!(plan.next.last_settled_at, Timestamp::new(28_800));
        assert!(plan.next.is_staked());
    }

    #[test]
    fn test_settle_zero_is_noop() {
        let plan = plan_settle(Some(staked_at(0)), &key(), Timestamp::new(5), &policy()).unwrap();
        assert!(plan.write.is_none());
        assert_eq!(plan.settlement.points_awarded, 0);
    }

    #[test]
    fn test_settle_unstaked_fails() {
        let mut rec = staked_at(0);
        rec.status = StakeStatus::Unstaked;
        rec.staked_at = None;
        let err = plan_settle(Some(rec), &key(), Timestamp::new(DAY), &policy()).unwrap_err();
        assert!(matches!(err, LaurelError::NotStaked(_)));
    }
}
