// crates/laurel-staking/src/accrual.rs
//
// Accrual calculator: maps a settled instant, the current time, and a rate
// to a whole number of points.
//
//   points = floor((rate_per_day * (now - last_settled_at) - settled_remainder) / one_day)
//
// Settlement then advances the settled instant by exactly
// `points * one_day / rate_per_day` seconds. The whole-second part goes into
// `last_settled_at`; the fraction is kept in `settled_remainder`, measured in
// units of `1 / rate_per_day` seconds. Fractional days therefore carry
// forward across claims and are never lost or paid twice.
//
// All arithmetic is done in u128.

use laurel_core::error::LaurelError;
use laurel_core::time::Timestamp;

/// Rate parameters for accrual. Both fields are positive once the owning
/// `StakingConfig` has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualPolicy {
    pub rate_per_day: u64,
    pub one_day_secs: u64,
}

impl AccrualPolicy {
    /// Points accrued from `last_settled_at` (plus `settled_remainder`) to `now`.
    ///
    /// # Errors
    /// Returns `LaurelError::ClockSkew` if `now` is before `last_settled_at`.
    /// Callers log it and treat it as zero accrual.
    pub fn accrued(
        &self,
        last_settled_at: Timestamp,
        settled_remainder: u64,
        now: Timestamp,
    ) -> Result<u64, LaurelError> {
        let elapsed = last_settled_at
            .checked_elapsed(now)
            .ok_or(LaurelError::ClockSkew {
                last_settled_at,
                now,
            })?;

        let units = (elapsed as u128) * (self.rate_per_day as u128);
        let unpaid = units.saturating_sub(settled_remainder as u128);
        let points = unpaid / (self.one_day_secs.max(1) as u128);
        Ok(u64::try_from(points).unwrap_or(u64::MAX))
    }

    /// The settled instant after paying `points` from the given one.
    ///
    /// Returns the new `(last_settled_at, settled_remainder)`.
    pub fn advance(
        &self,
        last_settled_at: Timestamp,
        settled_remainder: u64,
        points: u64,
    ) -> (Timestamp, u64) {
        let rate = self.rate_per_day.max(1) as u128;
        let total = (settled_remainder as u128) + (points as u128) * (self.one_day_secs as u128);
        let whole_secs = u64::try_from(total / rate).unwrap_or(u64::MAX);
        // remainder < rate, and rate fits in u64.
        let remainder = (total % rate) as u64;
        (last_settled_at.saturating_add_secs(whole_secs), remainder)
    }
}

/// Points accrued over `[last_settled_at, now]` at `rate_per_day` with no
/// carried remainder.
pub fn accrued(
    last_settled_at: Timestamp,
    now: Timestamp,
    rate_per_day: u64,
    one_day_secs: u64,
) -> Result<u64, LaurelError> {
    AccrualPolicy {
        rate_per_day,
        one_day_secs,
    }
    .accrued(last_settled_at, 0, now)
}
