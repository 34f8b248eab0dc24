use super::{CounterStore, QueueStore, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

#[derive(Debug)]
struct Expiring {
    value: i64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct State {
    counters: HashMap<String, Expiring>,
    // Front is the oldest payload
    lists: HashMap<String, VecDeque<String>>,
}

impl State {
    fn live_value(&mut self, key: &str) -> Option<i64> {
        let now = Instant::now();
        let expired = match self.counters.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.counters.remove(key);
        }
        None
    }
}

/// In-process store with the same semantics as [`super::RedisStore`].
///
/// Only suitable when a single process owns both admission and the workers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    pushed: Notify,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a list, oldest first
    pub async fn list(&self, key: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get_counter(&self, key: &str) -> Result<i64, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.live_value(key).unwrap_or(0))
    }

    async fn increment(&self, key: &str, by: i64, ttl: Duration) -> Result<i64, StoreError> {
        let mut state = self.state.lock().await;
        let value = state.live_value(key).unwrap_or(0) + by;
        state.counters.insert(
            key.to_string(),
            Expiring {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(value)
    }

    async fn set_marker(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.counters.insert(
            key.to_string(),
            Expiring {
                value: 1,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn has_marker(&self, key: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.live_value(key).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn push(&self, queue: &str, payload: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .lists
            .entry(queue.to_string())
            .or_default()
            .push_back(payload.to_string());
        drop(state);
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn claim(
        &self,
        queue: &str,
        in_flight: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register interest before checking so a push in between is not missed
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                let claimed = state.lists.get_mut(queue).and_then(VecDeque::pop_front);
                if let Some(payload) = claimed {
                    state
                        .lists
                        .entry(in_flight.to_string())
                        .or_default()
                        .push_back(payload.clone());
                    return Ok(Some(payload));
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ack(&self, in_flight: &str, payload: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if let Some(list) = state.lists.get_mut(in_flight) {
            if let Some(position) = list.iter().position(|p| p == payload) {
                list.remove(position);
            }
        }
        Ok(())
    }

    async fn requeue_in_flight(&self, in_flight: &str, queue: &str) -> Result<usize, StoreError> {
        let mut state = self.state.lock().await;
        let stranded: Vec<String> = state
            .lists
            .get_mut(in_flight)
            .map(|list| list.drain(..).collect())
            .unwrap_or_default();
        let moved = stranded.len();

        let pending = state.lists.entry(queue.to_string()).or_default();
        for payload in stranded.into_iter().rev() {
            pending.push_front(payload);
        }
        drop(state);

        if moved > 0 {
            self.pushed.notify_waiters();
        }
        Ok(moved)
    }

    async fn len(&self, queue: &str) -> Result<usize, StoreError> {
        let state = self.state.lock().await;
        Ok(state.lists.get(queue).map_or(0, VecDeque::len))
    }
}
