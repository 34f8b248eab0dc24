pub mod memory_store;
pub mod redis_store;

use async_trait::async_trait;
use std::time::Duration;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected store reply: {0}")]
    Protocol(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Protocol(err.to_string())
        }
    }
}

/// Counters and markers with expiry, shared by every process.
///
/// Increments must be atomic on the store side; callers never lock.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value of a counter, 0 when missing or expired
    async fn get_counter(&self, key: &str) -> Result<i64, StoreError>;

    /// Atomically add `by` to a counter and (re)arm its expiry
    async fn increment(&self, key: &str, by: i64, ttl: Duration) -> Result<i64, StoreError>;

    async fn set_marker(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn has_marker(&self, key: &str) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Durable list-based queue with an in-flight list per queue.
///
/// A claimed payload moves atomically from the pending list to the in-flight
/// list and stays there until acknowledged, so a crashed consumer never loses
/// work.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn push(&self, queue: &str, payload: &str) -> Result<(), StoreError>;

    /// Block up to `timeout` for the oldest pending payload
    async fn claim(
        &self,
        queue: &str,
        in_flight: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError>;

    async fn ack(&self, in_flight: &str, payload: &str) -> Result<(), StoreError>;

    /// Move everything left in the in-flight list back to the front of the
    /// pending list. Returns the number of payloads moved.
    async fn requeue_in_flight(&self, in_flight: &str, queue: &str) -> Result<usize, StoreError>;

    async fn len(&self, queue: &str) -> Result<usize, StoreError>;
}
