use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minute counters outlive their bucket to tolerate clock skew between hosts
pub const MINUTE_COUNTER_TTL: Duration = Duration::from_secs(2 * 60);
/// Day counters and notification markers
pub const DAY_COUNTER_TTL: Duration = Duration::from_secs(48 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitReason {
    /// Hard limit: too many requests in the current minute bucket
    MinuteLimit,
    /// Soft limit: daily character budget exceeded
    DayLimit,
}

impl std::fmt::Display for LimitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitReason::MinuteLimit => write!(f, "minute_limit"),
            LimitReason::DayLimit => write!(f, "day_limit"),
        }
    }
}

/// Outcome of a rate-limit check.
///
/// `reason` is set when a limit is involved: a blocked request always carries
/// `MinuteLimit`; an allowed request over the daily budget carries `DayLimit`.
/// `notify` is true only when the owner has not been told about the daily
/// budget yet today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateDecision {
    pub allowed: bool,
    pub reason: Option<LimitReason>,
    pub notify: bool,
}

impl RateDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            notify: false,
        }
    }

    pub fn block(reason: LimitReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            notify: false,
        }
    }

    pub fn over_budget(notify: bool) -> Self {
        Self {
            allowed: true,
            reason: Some(LimitReason::DayLimit),
            notify,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub requests_per_minute: i64,
    pub characters_per_day: i64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
            characters_per_day: 20_000,
        }
    }
}

/// Current counters for one owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub requests_this_minute: i64,
    pub characters_today: i64,
    pub notified_today: bool,
}
