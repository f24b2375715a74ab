// crates/laurel-staking/src/lib.rs
//
// laurel-staking: Accrual, the staking state machine, and exactly-once
// settlement for the Laurel badge staking engine.
//
// Points accrue at `rate_per_day` per full day staked. Settlement pays whole
// points and advances the settled instant by exactly the time those points
// are worth, so fractional days carry forward across claims.

pub mod accrual;
pub mod commands;
pub mod config;
pub mod ownership;
pub mod service;
pub mod settlement;
pub mod state_machine;

// Re-export key types for ergonomic access from downstream crates.
pub use accrual::{accrued, AccrualPolicy};
pub use commands::{
    ClaimOutcome, ClaimRequest, OwnerSummary, PendingPoints, PendingPointsRequest,
    SettleRequest, StakeOutcome, StakePosition, StakeRequest, UnstakeOutcome, UnstakeRequest,
};
pub use config::StakingConfig;
pub use ownership::StaticOwnershipRegistry;
pub use service::StakingService;
pub use settlement::{compute_settlement, Settlement, SettlementEngine, SettlementResult};
pub use state_machine::Plan;
