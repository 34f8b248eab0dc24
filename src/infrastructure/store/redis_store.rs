use super::{CounterStore, QueueStore, StoreError};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use std::time::Duration;
use tokio::sync::Mutex;

/// Upper bound on idle connections kept for blocking claims
const MAX_IDLE_BLOCKING_CONNECTIONS: usize = 8;

/// Redis-backed counters and job queue.
///
/// Regular commands share one auto-reconnecting multiplexed connection.
/// Blocking claims (`BLMOVE`) would stall that connection for every other
/// caller, so each claim borrows a dedicated connection from a small pool.
pub struct RedisStore {
    client: redis::Client,
    manager: ConnectionManager,
    blocking: Mutex<Vec<MultiplexedConnection>>,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client.clone()).await?;

        Ok(Self {
            client,
            manager,
            blocking: Mutex::new(Vec::new()),
        })
    }

    async fn borrow_blocking(&self) -> Result<MultiplexedConnection, StoreError> {
        if let Some(conn) = self.blocking.lock().await.pop() {
            return Ok(conn);
        }
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    async fn return_blocking(&self, conn: MultiplexedConnection) {
        let mut idle = self.blocking.lock().await;
        if idle.len() < MAX_IDLE_BLOCKING_CONNECTIONS {
            idle.push(conn);
        }
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn get_counter(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.manager.clone();
        let value: Option<i64> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value.unwrap_or(0))
    }

    async fn increment(&self, key: &str, by: i64, ttl: Duration) -> Result<i64, StoreError> {
        let mut conn = self.manager.clone();
        let (value,): (i64,) = redis::pipe()
            .atomic()
            .cmd("INCRBY")
            .arg(key)
            .arg(by)
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl.as_secs())
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set_marker(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(1)
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn has_marker(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.manager.clone();
        let count: i64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(count > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(StoreError::Protocol(format!("PING answered {}", reply)))
        }
    }
}

#[async_trait]
impl QueueStore for RedisStore {
    async fn push(&self, queue: &str, payload: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let _: i64 = redis::cmd("LPUSH")
            .arg(queue)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn claim(
        &self,
        queue: &str,
        in_flight: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError> {
        let mut conn = self.borrow_blocking().await?;
        let claimed: Result<Option<String>, redis::RedisError> = redis::cmd("BLMOVE")
            .arg(queue)
            .arg(in_flight)
            .arg("RIGHT")
            .arg("LEFT")
            .arg(timeout.as_secs_f64())
            .query_async(&mut conn)
            .await;

        // A connection that errored may be half-closed; let it drop
        if claimed.is_ok() {
            self.return_blocking(conn).await;
        }
        Ok(claimed?)
    }

    async fn ack(&self, in_flight: &str, payload: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let removed: i64 = redis::cmd("LREM")
            .arg(in_flight)
            .arg(1)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        if removed == 0 {
            tracing::warn!(in_flight = %in_flight, "Acknowledged job was not in the in-flight list");
        }
        Ok(())
    }

    async fn requeue_in_flight(&self, in_flight: &str, queue: &str) -> Result<usize, StoreError> {
        let mut conn = self.manager.clone();
        let mut moved = 0;
        loop {
            let payload: Option<String> = redis::cmd("LMOVE")
                .arg(in_flight)
                .arg(queue)
                .arg("LEFT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await?;
            match payload {
                Some(_) => moved += 1,
                None => return Ok(moved),
            }
        }
    }

    async fn len(&self, queue: &str) -> Result<usize, StoreError> {
        let mut conn = self.manager.clone();
        let length: usize = redis::cmd("LLEN").arg(queue).query_async(&mut conn).await?;
        Ok(length)
    }
}
