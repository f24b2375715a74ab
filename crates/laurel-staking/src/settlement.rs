// crates/laurel-staking/src/settlement.rs
//
// Settlement engine: turns accrued time into settled points, atomically.
//
// A settlement reads the stake record, computes the accrual up to `as_of`,
// and commits `balance += points` together with the advanced settled instant
// and a receipt, as one compare-and-swap against the ledger. A lost race is
// re-read and recomputed from scratch, so two concurrent settlements of the
// same pair can never both pay for the same interval.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use laurel_core::error::LaurelError;
use laurel_core::ids::StakeKey;
use laurel_core::receipt::{dedup_key, SettlementReceipt};
use laurel_core::record::StakeRecord;
use laurel_core::time::{Clock, Timestamp};
use laurel_core::traits::LedgerStore;

use crate::accrual::AccrualPolicy;
use crate::config::StakingConfig;
use crate::state_machine::{self, Plan};

/// What a settlement awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub points_awarded: u64,
    pub new_balance: u64,
    pub new_last_settled_at: Timestamp,
}

/// A computed (not yet committed) settlement of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub points_awarded: u64,
    pub new_balance: u64,
    pub new_last_settled_at: Timestamp,
    pub new_remainder: u64,
    /// Present iff `points_awarded > 0`.
    pub receipt: Option<SettlementReceipt>,
}

impl Settlement {
    /// The no-op settlement of a record: nothing paid, nothing moved.
    pub fn none(record: &StakeRecord) -> Self {
        Self {
            points_awarded: 0,
            new_balance: record.accrued_points_balance,
            new_last_settled_at: record.last_settled_at,
            new_remainder: record.settled_remainder,
            receipt: None,
        }
    }

    pub fn result(&self) -> SettlementResult {
        SettlementResult {
            points_awarded: self.points_awarded,
            new_balance: self.new_balance,
            new_last_settled_at: self.new_last_settled_at,
        }
    }

    /// Apply this settlement's balance and settled instant to a record.
    pub fn apply_to(&self, record: &mut StakeRecord) {
        record.accrued_points_balance = self.new_balance;
        record.last_settled_at = self.new_last_settled_at;
        record.settled_remainder = self.new_remainder;
    }
}

/// Compute the settlement of a staked record up to `as_of`.
///
/// The receipt carries a nil command id until the engine stamps it.
/// Clock skew (`as_of` before the settled instant) is logged as a
/// data-integrity warning and settles zero points.
pub fn compute_settlement(record: &StakeRecord, as_of: Timestamp, policy: &AccrualPolicy) -> Settlement {
    let points = match policy.accrued(record.last_settled_at, record.settled_remainder, as_of) {
        Ok(points) => points,
        Err(e) => {
            tracing::warn!("{} for {}; treating as zero accrual", e, record.key());
            0
        }
    };

    if points == 0 {
        return Settlement::none(record);
    }

    let (new_last_settled_at, new_remainder) =
        policy.advance(record.last_settled_at, record.settled_remainder, points);
    let new_balance = record.accrued_points_balance.saturating_add(points);

    let receipt = SettlementReceipt {
        dedup_key: dedup_key(
            &record.owner,
            &record.token,
            record.last_settled_at,
            record.settled_remainder,
        ),
        command_id: Uuid::nil(),
        owner: record.owner.clone(),
        token: record.token.clone(),
        points_awarded: points,
        new_balance,
        window_start: record.last_settled_at,
        new_last_settled_at,
        settled_at: as_of,
    };

    Settlement {
        points_awarded: points,
        new_balance,
        new_last_settled_at,
        new_remainder,
        receipt: Some(receipt),
    }
}

/// The outcome of a committed (or deliberately skipped) plan.
#[derive(Debug, Clone)]
pub struct Applied {
    /// The record as stored after the operation.
    pub record: StakeRecord,
    pub settlement: Settlement,
}

/// Orchestrates atomic read-compute-commit cycles against the ledger.
pub struct SettlementEngine<S: LedgerStore + ?Sized = dyn LedgerStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: StakingConfig,
}

impl<S: LedgerStore + ?Sized> SettlementEngine<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: StakingConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    /// Settle accrual for a staked pair up to `as_of` (clamped to now).
    ///
    /// Idempotent: with no time elapsed since the last settlement it awards
    /// zero points and writes nothing.
    ///
    /// # Errors
    /// `NotStaked` if the pair is not staked; `StoreUnavailable` if the store
    /// fails or the commit keeps losing races.
    pub async fn settle(&self, key: &StakeKey, as_of: Timestamp) -> Result<SettlementResult, LaurelError> {
        let policy = self.config.policy();
        let applied = self
            .commit_with_retry("settle", key, |current, now| {
                state_machine::plan_settle(current, key, as_of.min(now), &policy)
            })
            .await?;
        Ok(applied.settlement.result())
    }

    /// Points that `settle` would award right now. Read-only.
    ///
    /// Unknown and unstaked pairs have nothing pending.
    pub async fn pending_points(&self, key: &StakeKey) -> Result<u64, LaurelError> {
        let now = self.clock.now();
        Ok(self
            .store
            .get_record(key)
            .await?
            .filter(StakeRecord::is_staked)
            .map(|record| compute_settlement(&record, now, &self.config.policy()).points_awarded)
            .unwrap_or(0))
    }

    /// Look up a settlement receipt.
    pub async fn receipt(&self, dedup_key: &str) -> Result<Option<SettlementReceipt>, LaurelError> {
        self.store.get_receipt(dedup_key).await
    }

    /// Run `plan` against the current record and commit its write,
    /// retrying lost compare-and-swap races with exponential backoff.
    ///
    /// `plan` is re-evaluated on every attempt against a fresh read and a
    /// fresh clock reading. Validation errors it returns are terminal.
    pub(crate) async fn commit_with_retry<F>(
        &self,
        op: &'static str,
        key: &StakeKey,
        plan: F,
    ) -> Result<Applied, LaurelError>
    where
        F: Fn(Option<StakeRecord>, Timestamp) -> Result<Plan, LaurelError> + Send + Sync,
    {
        let max_attempts = self.config.max_commit_attempts.max(1);
        let command_id = Uuid::now_v7();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let now = self.clock.now();
            let current = self.store.get_record(key).await?;
            let Plan {
                next,
                write,
                mut settlement,
            } = plan(current, now)?;

            let mut write = match write {
                Some(write) => write,
                None => {
                    return Ok(Applied {
                        record: next,
                        settlement,
                    })
                }
            };
            if let Some(receipt) = write.receipt.as_mut() {
                receipt.command_id = command_id;
            }
            if let Some(receipt) = settlement.receipt.as_mut() {
                receipt.command_id = command_id;
            }
            let receipt = write.receipt.clone();

            match self.store.commit(write).await {
                Ok(record) => {
                    return Ok(Applied { record, settlement });
                }
                Err(LaurelError::StoreConflict(reason)) => {
                    // A proxying store can report a conflict for a write that
                    // did land. Only our own command id proves it was ours.
                    if let Some(receipt) = &receipt {
                        if self.store.get_receipt(&receipt.dedup_key).await?.as_ref() == Some(receipt) {
                            tracing::info!("{} {}: settlement {} already applied", op, key, receipt.dedup_key);
                            let record = self.store.get_record(key).await?.ok_or_else(|| {
                                LaurelError::StoreUnavailable(format!("record {} vanished", key))
                            })?;
                            return Ok(Applied { record, settlement });
                        }
                    }

                    if attempt >= max_attempts {
                        tracing::warn!(
                            "{} {}: giving up after {} conflicting attempts",
                            op,
                            key,
                            attempt
                        );
                        return Err(LaurelError::StoreUnavailable(format!(
                            "{} {} lost {} commit races: {}",
                            op, key, attempt, reason
                        )));
                    }

                    let delay = self.config.backoff(attempt);
                    tracing::warn!(
                        "{} {}: commit conflict (attempt {}/{}), retrying in {:?}: {}",
                        op,
                        key,
                        attempt,
                        max_attempts,
                        delay,
                        reason
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
