// crates/laurel-core/src/time.rs
//
// Timestamps and the clock abstraction.
//
// Timestamps are Unix epoch seconds (UTC). The engine never reads the system
// time directly; it asks a `Clock`, so tests can drive time by hand with
// `ManualClock`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed from `self` to `now`, or `None` if `now` is earlier.
    pub fn checked_elapsed(&self, now: Timestamp) -> Option<u64> {
        now.0.checked_sub(self.0)
    }

    pub fn saturating_add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Convert to a chrono `DateTime<Utc>` for display. Values beyond
    /// chrono's range fall back to the epoch.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_default()
    }

    /// Build from a chrono `DateTime<Utc>`. Pre-epoch instants clamp to zero.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(u64::try_from(dt.timestamp()).unwrap_or(0))
    }

    /// RFC 3339 rendering, e.g. `2026-10-15T00:00:00+00:00`.
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime().to_rfc3339()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time, UTC.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(Utc::now())
    }
}

/// A clock that only moves when told to. Shared between tasks via `Arc`.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            secs: AtomicU64::new(start.as_secs()),
        }
    }

    /// Jump to an absolute time. Moving backwards is allowed so tests can
    /// simulate skew.
    pub fn set(&self, at: Timestamp) {
        self.secs.store(at.as_secs(), Ordering::SeqCst);
    }

    /// Move forward by `secs` seconds.
    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.secs.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_elapsed() {
        let t = Timestamp::new(100);
        assert_eq!(t.checked_elapsed(Timestamp::new(160)), Some(60));
        assert_eq!(t.checked_elapsed(Timestamp::new(100)), Some(0));
        assert_eq!(t.checked_elapsed(Timestamp::new(99)), None);
    }

    #[test]
    fn test_datetime_roundtrip() {
        let t = Timestamp::new(1_760_486_400);
        assert_eq!(Timestamp::from_datetime(t.to_datetime()), t);
        assert!(t.to_rfc3339().starts_with("2025-10-15T"));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(Timestamp::new(10));
        assert_eq!(clock.now(), Timestamp::new(10));
        clock.advance(5);
        assert_eq!(clock.now(), Timestamp::new(15));
        clock.set(Timestamp::new(3));
        assert_eq!(clock.now(), Timestamp::new(3));
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now().as_secs() > 1_577_836_800);
    }
}
