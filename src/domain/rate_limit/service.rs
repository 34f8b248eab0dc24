use super::clock::Clock;
use super::model::{
    LimitReason, RateDecision, RateLimits, UsageSnapshot, DAY_COUNTER_TTL, MINUTE_COUNTER_TTL,
};
use crate::domain::shared::OwnerId;
use crate::infrastructure::store::{CounterStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Admission control over counters kept in the shared store.
///
/// - Hard limit: at most `requests_per_minute` accepted requests per wall-clock
///   minute bucket. Fixed windows, so a burst straddling a minute boundary can
///   reach twice the limit.
/// - Soft limit: `characters_per_day` per calendar day (UTC). Never blocks,
///   only owes the owner one notice per day.
///
/// The limiter holds no state of its own; every instance sharing a store sees
/// the same counters.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limits: RateLimits,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, limits: RateLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            limits,
            clock,
        }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    /// Decide whether a request of `weight` characters may proceed.
    ///
    /// Read-only: nothing is counted until [`RateLimiter::increment`].
    pub async fn check(&self, owner: &OwnerId, weight: i64) -> Result<RateDecision, StoreError> {
        let now = self.clock.now();

        let requests = self.store.get_counter(&minute_key(owner, now)).await?;
        if requests >= self.limits.requests_per_minute {
            tracing::info!(
                owner_id = %owner,
                requests = requests,
                limit = self.limits.requests_per_minute,
                "Minute request limit reached"
            );
            return Ok(RateDecision::block(LimitReason::MinuteLimit));
        }

        let characters = self.store.get_counter(&day_key(owner, now)).await?;
        if characters + weight <= self.limits.characters_per_day {
            return Ok(RateDecision::allow());
        }

        let already_notified = self.store.has_marker(&notified_key(owner, now)).await?;
        tracing::info!(
            owner_id = %owner,
            characters_today = characters,
            weight = weight,
            limit = self.limits.characters_per_day,
            already_notified = already_notified,
            "Daily character budget exceeded"
        );
        Ok(RateDecision::over_budget(!already_notified))
    }

    /// Count an accepted request: one request in the minute bucket and
    /// `weight` characters in the day bucket.
    pub async fn increment(&self, owner: &OwnerId, weight: i64) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.store
            .increment(&minute_key(owner, now), 1, MINUTE_COUNTER_TTL)
            .await?;
        self.store
            .increment(&day_key(owner, now), weight, DAY_COUNTER_TTL)
            .await?;
        Ok(())
    }

    /// Add characters that only became known after admission (extracted
    /// documents, transcribed voice messages). The request itself was already
    /// counted.
    pub async fn add_characters(&self, owner: &OwnerId, weight: i64) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.store
            .increment(&day_key(owner, now), weight, DAY_COUNTER_TTL)
            .await?;
        Ok(())
    }

    pub async fn mark_notified(&self, owner: &OwnerId) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.store
            .set_marker(&notified_key(owner, now), DAY_COUNTER_TTL)
            .await
    }

    pub async fn usage(&self, owner: &OwnerId) -> Result<UsageSnapshot, StoreError> {
        let now = self.clock.now();
        Ok(UsageSnapshot {
            requests_this_minute: self.store.get_counter(&minute_key(owner, now)).await?,
            characters_today: self.store.get_counter(&day_key(owner, now)).await?,
            notified_today: self.store.has_marker(&notified_key(owner, now)).await?,
        })
    }

    /// Start of the next day bucket
    pub fn day_resets_at(&self) -> DateTime<Utc> {
        let tomorrow = self.clock.now().date_naive() + chrono::Duration::days(1);
        tomorrow.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

fn minute_key(owner: &OwnerId, now: DateTime<Utc>) -> String {
    format!("rate:minute:{}:{}", owner, now.timestamp().div_euclid(60))
}

fn day_key(owner: &OwnerId, now: DateTime<Utc>) -> String {
    format!("rate:day:{}:{}", owner, now.format("%Y%m%d"))
}

fn notified_key(owner: &OwnerId, now: DateTime<Utc>) -> String {
    format!("rate:notified:{}:{}", owner, now.format("%Y%m%d"))
}
