// crates/laurel-core/src/error.rs

use thiserror::Error;

use crate::time::Timestamp;

/// Error taxonomy for the Laurel staking engine.
///
/// Every failed operation surfaces exactly one of these kinds. The first four
/// are validation failures and are never retried; `StoreConflict` is retried
/// internally before being surfaced as `StoreUnavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaurelError {
    /// The caller is not the verified owner of the token, or the token is
    /// staked under a different owner.
    #[error("Not owner: {0}")]
    NotOwner(String),

    /// Stake was requested for a token that is already staked.
    #[error("Already staked: {0}")]
    AlreadyStaked(String),

    /// Unstake or claim was requested for a token that is not staked.
    #[error("Not staked: {0}")]
    NotStaked(String),

    /// A claim computed zero points.
    #[error("No pending points: {0}")]
    NoPendingPoints(String),

    /// The ledger store could not be reached or gave up. The operation has
    /// definitely not committed.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A compare-and-swap against the ledger store lost a race.
    #[error("Store conflict: {0}")]
    StoreConflict(String),

    /// The clock reads earlier than a recorded settlement instant.
    #[error("Clock skew: now {now} is before last settlement {last_settled_at}")]
    ClockSkew {
        last_settled_at: Timestamp,
        now: Timestamp,
    },

    /// A request failed boundary validation (empty or oversized identifier).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration values are out of range.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The ownership verification collaborator could not answer.
    #[error("Ownership verification unavailable: {0}")]
    OwnershipUnavailable(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LaurelError {
    /// Stable, machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LaurelError::NotOwner(_) => "NotOwner",
            LaurelError::AlreadyStaked(_) => "AlreadyStaked",
            LaurelError::NotStaked(_) => "NotStaked",
            LaurelError::NoPendingPoints(_) => "NoPendingPoints",
            LaurelError::StoreUnavailable(_) => "StoreUnavailable",
            LaurelError::StoreConflict(_) => "StoreConflict",
            LaurelError::ClockSkew { .. } => "ClockSkew",
            LaurelError::InvalidRequest(_) => "InvalidRequest",
            LaurelError::InvalidConfig(_) => "InvalidConfig",
            LaurelError::OwnershipUnavailable(_) => "OwnershipUnavailable",
            LaurelError::Serialization(_) => "Serialization",
        }
    }

    /// Whether the error should be retried by the commit loop.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LaurelError::StoreConflict(_))
    }
}

impl From<serde_json::Error> for LaurelError {
    fn from(e: serde_json::Error) -> Self {
        LaurelError::Serialization(e.to_string())
    }
}
