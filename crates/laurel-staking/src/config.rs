// crates/laurel-staking/src/config.rs
//
// Staking configuration: accrual rate, day length, and commit retry policy.
// Deserialized from the `[staking]` table of the daemon config; every field
// has a default so an empty table is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use laurel_core::error::LaurelError;

use crate::accrual::AccrualPolicy;

/// Runtime configuration for the staking engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Points accrued per full day staked.
    #[serde(default = "default_rate_per_day")]
    pub rate_per_day: u64,

    /// Length of a day in seconds. Shortened in test deployments.
    #[serde(default = "default_one_day_secs")]
    pub one_day_secs: u64,

    /// Total commit attempts before a lost compare-and-swap race is
    /// surfaced as `StoreUnavailable`.
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,

    /// Base delay of the exponential backoff between commit attempts.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_rate_per_day() -> u64 {
    3
}

fn default_one_day_secs() -> u64 {
    86_400
}

fn default_max_commit_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    5
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            rate_per_day: default_rate_per_day(),
            one_day_secs: default_one_day_secs(),
            max_commit_attempts: default_max_commit_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl StakingConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), LaurelError> {
        if self.rate_per_day == 0 {
            return Err(LaurelError::InvalidConfig(
                "rate_per_day must be positive".to_string(),
            ));
        }
        if self.one_day_secs == 0 {
            return Err(LaurelError::InvalidConfig(
                "one_day_secs must be positive".to_string(),
            ));
        }
        if self.max_commit_attempts == 0 {
            return Err(LaurelError::InvalidConfig(
                "max_commit_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn policy(&self) -> AccrualPolicy {
        AccrualPolicy {
            rate_per_day: self.rate_per_day,
            one_day_secs: self.one_day_secs,
        }
    }

    /// Delay before commit attempt `attempt + 1`, doubling from the base.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = StakingConfig::default();
        assert_eq!(cfg.rate_per_day, 3);
        assert_eq!(cfg.one_day_secs, 86_400);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_rate_rejected() {
        let cfg = StakingConfig {
            rate_per_day: 0,
            ..StakingConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(LaurelError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let cfg = StakingConfig {
            max_commit_attempts: 0,
            ..StakingConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles() {
        let cfg = StakingConfig {
            backoff_base_ms: 10,
            ..StakingConfig::default()
        };
        assert_eq!(cfg.backoff(1), Duration::from_millis(10));
        assert_eq!(cfg.backoff(2), Duration::from_millis(20));
        assert_eq!(cfg.backoff(4), Duration::from_millis(80));
    }
}
