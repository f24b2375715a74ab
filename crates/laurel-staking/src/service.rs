// crates/laurel-staking/src/service.rs
//
// StakingService: the operations the engine exposes to its callers.
//
// Ownership is verified before any ledger access that could write, and never
// while a record is being read-modified-written. All writes go through the
// settlement engine's compare-and-swap loop.

use std::sync::Arc;

use laurel_core::error::LaurelError;
use laurel_core::ids::{OwnerId, StakeKey, TokenId};
use laurel_core::receipt::SettlementReceipt;
use laurel_core::record::StakeRecord;
use laurel_core::time::{Clock, Timestamp};
use laurel_core::traits::{LedgerStore, OwnershipVerifier};

use crate::commands::{
    ClaimOutcome, OwnerSummary, PendingPoints, StakeOutcome, StakePosition, UnstakeOutcome,
};
use crate::config::StakingConfig;
use crate::settlement::{compute_settlement, SettlementEngine, SettlementResult};
use crate::state_machine::{plan_claim, plan_stake, plan_unstake};

/// Entry point for Stake, Unstake, ClaimPoints, and the read-side queries.
pub struct StakingService<S: LedgerStore + ?Sized = dyn LedgerStore> {
    engine: SettlementEngine<S>,
    verifier: Arc<dyn OwnershipVerifier>,
}

impl<S: LedgerStore + ?Sized> StakingService<S> {
    /// Create a service over the given collaborators.
    ///
    /// # Errors
    /// `InvalidConfig` if the staking configuration is out of range.
    pub fn new(
        store: Arc<S>,
        verifier: Arc<dyn OwnershipVerifier>,
        clock: Arc<dyn Clock>,
        config: StakingConfig,
    ) -> Result<Self, LaurelError> {
        config.validate()?;
        Ok(Self {
            engine: SettlementEngine::new(store, clock, config),
            verifier,
        })
    }

    pub fn engine(&self) -> &SettlementEngine<S> {
        &self.engine
    }

    pub fn config(&self) -> &StakingConfig {
        self.engine.config()
    }

    pub fn now(&self) -> Timestamp {
        self.engine.clock().now()
    }

    /// Stake a token, opening an accrual window at now.
    pub async fn stake(&self, key: &StakeKey) -> Result<StakeOutcome, LaurelError> {
        self.verify_owner(key).await?;

        let applied = self
            .engine
            .commit_with_retry("stake", key, |current, now| plan_stake(current, key, now))
            .await?;

        let staked_at = applied
            .record
            .staked_at
            .unwrap_or(applied.record.last_settled_at);
        tracing::info!("Staked {} at {}", key, staked_at);

        Ok(StakeOutcome {
            status: applied.record.status,
            staked_at,
        })
    }

    /// Settle and close the accrual window.
    pub async fn unstake(&self, key: &StakeKey) -> Result<UnstakeOutcome, LaurelError> {
        self.check_staker(key).await?;
        let policy = self.config().policy();

        let applied = self
            .engine
            .commit_with_retry("unstake", key, |current, now| {
                plan_unstake(current, key, now, &policy)
            })
            .await?;

        tracing::info!(
            "Unstaked {}: awarded {} points, balance {}",
            key,
            applied.settlement.points_awarded,
            applied.record.accrued_points_balance
        );

        Ok(UnstakeOutcome {
            status: applied.record.status,
            points_awarded: applied.settlement.points_awarded,
            new_balance: applied.record.accrued_points_balance,
        })
    }

    /// Settle accrual up to now, keeping the token staked.
    pub async fn claim(&self, key: &StakeKey) -> Result<ClaimOutcome, LaurelError> {
        self.check_staker(key).await?;
        let policy = self.config().policy();

        let applied = self
            .engine
            .commit_with_retry("claim", key, |current, now| {
                plan_claim(current, key, now, &policy)
            })
            .await?;

        tracing::info!(
            "Claimed {} points for {}, balance {}",
            applied.settlement.points_awarded,
            key,
            applied.record.accrued_points_balance
        );

        Ok(ClaimOutcome {
            points_awarded: applied.settlement.points_awarded,
            new_balance: applied.record.accrued_points_balance,
        })
    }

    /// Settle up to `as_of` (default now). Zero points is not an error.
    pub async fn settle(
        &self,
        key: &StakeKey,
        as_of: Option<Timestamp>,
    ) -> Result<SettlementResult, LaurelError> {
        let as_of = as_of.unwrap_or_else(|| self.now());
        self.engine.settle(key, as_of).await
    }

    pub async fn pending_points(&self, key: &StakeKey) -> Result<PendingPoints, LaurelError> {
        Ok(PendingPoints {
            pending_points: self.engine.pending_points(key).await?,
        })
    }

    /// Whether any owner currently has `token` staked.
    pub async fn is_staked(&self, token: &TokenId) -> Result<bool, LaurelError> {
        Ok(self.staker_of(token).await?.is_some())
    }

    /// The owner currently staking `token`, if any.
    pub async fn staker_of(&self, token: &TokenId) -> Result<Option<OwnerId>, LaurelError> {
        self.engine.store().staker_of(token).await
    }

    /// Tokens `owner` currently has staked, ordered by token id.
    pub async fn staked_tokens(&self, owner: &OwnerId) -> Result<Vec<TokenId>, LaurelError> {
        Ok(self
            .engine
            .store()
            .records_for_owner(owner)
            .await?
            .into_iter()
            .filter(StakeRecord::is_staked)
            .map(|r| r.token)
            .collect())
    }

    /// All records for `owner` with their live pending points.
    pub async fn owner_summary(&self, owner: &OwnerId) -> Result<OwnerSummary, LaurelError> {
        let now = self.now();
        let policy = self.config().policy();
        let records = self.engine.store().records_for_owner(owner).await?;

        let positions: Vec<StakePosition> = records
            .into_iter()
            .map(|record| {
                let pending_points = if record.is_staked() {
                    compute_settlement(&record, now, &policy).points_awarded
                } else {
                    0
                };
                StakePosition {
                    record,
                    pending_points,
                }
            })
            .collect();

        Ok(OwnerSummary {
            owner_id: owner.to_string(),
            staked_count: positions.iter().filter(|p| p.record.is_staked()).count(),
            total_balance: positions
                .iter()
                .fold(0u64, |acc, p| acc.saturating_add(p.record.accrued_points_balance)),
            total_pending: positions
                .iter()
                .fold(0u64, |acc, p| acc.saturating_add(p.pending_points)),
            positions,
        })
    }

    pub async fn receipt(&self, dedup_key: &str) -> Result<Option<SettlementReceipt>, LaurelError> {
        self.engine.receipt(dedup_key).await
    }

    async fn verify_owner(&self, key: &StakeKey) -> Result<(), LaurelError> {
        match self.verifier.is_owner(&key.owner, &key.token).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(LaurelError::NotOwner(format!(
                "{} does not own token {}",
                key.owner, key.token
            ))),
            Err(e @ LaurelError::OwnershipUnavailable(_)) => Err(e),
            Err(e) => Err(LaurelError::OwnershipUnavailable(e.to_string())),
        }
    }

    /// Reject operations on a token staked under a different owner.
    async fn check_staker(&self, key: &StakeKey) -> Result<(), LaurelError> {
        match self.engine.store().staker_of(&key.token).await? {
            Some(holder) if holder != key.owner => Err(LaurelError::NotOwner(format!(
                "token {} is staked by another owner",
                key.token
            ))),
            _ => Ok(()),
        }
    }
}
