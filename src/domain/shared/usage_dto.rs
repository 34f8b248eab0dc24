use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response for GET /api/usage
#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub usage: UsageStats,
    pub limits: UsageLimits,
    pub day_resets_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageStats {
    pub requests_this_minute: i64,
    pub characters_today: i64,
    pub notified_today: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageLimits {
    pub requests_per_minute: i64,
    pub characters_per_day: i64,
}
