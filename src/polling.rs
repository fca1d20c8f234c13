//! Adaptive polling cadence.
//!
//! DESIGN
//! ======
//! The interval is a pure function of how long ago the most recent message
//! was created: busy rooms are polled often, quiet rooms rarely. Kept free of
//! any clock or network access so the feed loop can recompute it after every
//! fetch and tests can pin exact boundaries.

use std::time::Duration;

use crate::message::Message;

pub const DEFAULT_EMPTY_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_ACTIVE_INTERVAL_MS: u64 = 1500;
pub const DEFAULT_RECENT_INTERVAL_MS: u64 = 4000;
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 8000;

/// Messages younger than this count as an active conversation.
pub const ACTIVE_AGE_MS: i64 = 60_000;
/// Messages younger than this (and older than active) count as recent.
pub const RECENT_AGE_MS: i64 = 300_000;

/// Polling intervals for each activity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub empty: Duration,
    pub active: Duration,
    pub recent: Duration,
    pub idle: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            empty: Duration::from_millis(DEFAULT_EMPTY_INTERVAL_MS),
            active: Duration::from_millis(DEFAULT_ACTIVE_INTERVAL_MS),
            recent: Duration::from_millis(DEFAULT_RECENT_INTERVAL_MS),
            idle: Duration::from_millis(DEFAULT_IDLE_INTERVAL_MS),
        }
    }
}

impl PollPolicy {
    /// Interval until the next poll given the newest message of a snapshot
    /// (its last element) and the current time in unix milliseconds.
    #[must_use]
    pub fn interval(&self, latest: Option<&Message>, now_ms: i64) -> Duration {
        let Some(latest) = latest else {
            return self.empty;
        };
        // Clock skew can put messages in the future; treat those as brand new.
        let age_ms = now_ms.saturating_sub(latest.created_at_ms()).max(0);
        if age_ms < ACTIVE_AGE_MS {
            self.active
        } else if age_ms < RECENT_AGE_MS {
            self.recent
        } else {
            self.idle
        }
    }
}

/// [`PollPolicy::interval`] with the default bands.
#[must_use]
pub fn poll_interval(latest: Option<&Message>, now_ms: i64) -> Duration {
    PollPolicy::default().interval(latest, now_ms)
}

/// Current wall-clock time in unix milliseconds.
#[must_use]
pub fn now_unix_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
#[path = "polling_test.rs"]
mod tests;
