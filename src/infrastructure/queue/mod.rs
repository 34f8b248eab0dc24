use crate::domain::job::{EnvelopeHeader, JobEnvelope};
use crate::infrastructure::store::{QueueStore, StoreError};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("could not encode job: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A payload taken off the pending list, still held in the in-flight list
/// until [`JobQueue::ack`]
#[derive(Debug)]
pub struct ClaimedJob {
    raw: String,
    pub envelope: Result<JobEnvelope, serde_json::Error>,
}

impl ClaimedJob {
    /// Best-effort identification, available even when decoding failed
    pub fn header(&self) -> EnvelopeHeader {
        match &self.envelope {
            Ok(envelope) => EnvelopeHeader::from(envelope),
            Err(_) => EnvelopeHeader::parse_lenient(&self.raw),
        }
    }
}

/// FIFO of job envelopes on top of a [`QueueStore`].
///
/// Delivery is at-least-once: jobs claimed by a process that dies before
/// acknowledging them are put back by [`JobQueue::recover_in_flight`] on the
/// next start.
pub struct JobQueue {
    store: Arc<dyn QueueStore>,
    name: String,
    in_flight: String,
}

impl JobQueue {
    pub fn new(store: Arc<dyn QueueStore>, name: impl Into<String>) -> Self {
        let name = name.into();
        let in_flight = format!("{}:in_flight", name);
        Self {
            store,
            name,
            in_flight,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn enqueue(&self, envelope: &JobEnvelope) -> Result<(), QueueError> {
        let payload = serde_json::to_string(envelope)?;
        self.store.push(&self.name, &payload).await?;

        tracing::debug!(
            job_id = %envelope.id,
            owner_id = %envelope.owner_id,
            kind = envelope.payload.kind(),
            queue = %self.name,
            "Job enqueued"
        );
        Ok(())
    }

    /// Wait up to `timeout` for the next job
    pub async fn claim(&self, timeout: Duration) -> Result<Option<ClaimedJob>, StoreError> {
        let Some(raw) = self.store.claim(&self.name, &self.in_flight, timeout).await? else {
            return Ok(None);
        };

        let envelope = serde_json::from_str::<JobEnvelope>(&raw);
        Ok(Some(ClaimedJob { raw, envelope }))
    }

    pub async fn ack(&self, job: &ClaimedJob) -> Result<(), StoreError> {
        self.store.ack(&self.in_flight, &job.raw).await
    }

    /// Put back jobs a previous process claimed but never finished.
    ///
    /// Only safe before this process starts its own workers.
    pub async fn recover_in_flight(&self) -> Result<usize, StoreError> {
        let recovered = self
            .store
            .requeue_in_flight(&self.in_flight, &self.name)
            .await?;
        if recovered > 0 {
            tracing::warn!(
                queue = %self.name,
                recovered = recovered,
                "Recovered unfinished jobs from a previous run"
            );
        }
        Ok(recovered)
    }

    pub async fn pending(&self) -> Result<usize, StoreError> {
        self.store.len(&self.name).await
    }
}
