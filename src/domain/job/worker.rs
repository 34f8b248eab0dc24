use super::error::JobError;
use super::processor::JobProcessor;
use crate::infrastructure::queue::{ClaimedJob, JobQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Pause after a failed claim before asking the store again
const CLAIM_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Fixed number of workers sharing one queue.
///
/// Each worker runs one job to completion before claiming the next; chunks
/// of a job are never spread across workers.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    processor: Arc<JobProcessor>,
    concurrency: usize,
    poll_timeout: Duration,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<JobQueue>,
        processor: Arc<JobProcessor>,
        concurrency: usize,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            processor,
            concurrency: concurrency.max(1),
            poll_timeout,
        }
    }

    /// Start the workers. They stop claiming once `shutdown` turns true and
    /// exit after finishing their current job.
    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        tracing::info!(
            workers = self.concurrency,
            queue = %self.queue.name(),
            "Starting worker pool"
        );

        (0..self.concurrency)
            .map(|worker_id| {
                let pool = self.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move { pool.run(worker_id, shutdown).await })
            })
            .collect()
    }

    async fn run(&self, worker_id: usize, shutdown: watch::Receiver<bool>) {
        tracing::debug!(worker_id = worker_id, "Worker started");

        while !*shutdown.borrow() {
            let claimed = match self.queue.claim(self.poll_timeout).await {
                Ok(Some(claimed)) => claimed,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(
                        worker_id = worker_id,
                        error = %e,
                        "Failed to claim job, backing off"
                    );
                    tokio::time::sleep(CLAIM_ERROR_BACKOFF).await;
                    continue;
                }
            };

            self.handle(worker_id, &claimed).await;

            if let Err(e) = self.queue.ack(&claimed).await {
                tracing::error!(
                    worker_id = worker_id,
                    job_id = ?claimed.header().id,
                    error = %e,
                    "Failed to acknowledge job"
                );
            }
        }

        tracing::debug!(worker_id = worker_id, "Worker stopped");
    }

    /// Drive one claimed job to a terminal state
    async fn handle(&self, worker_id: usize, claimed: &ClaimedJob) {
        let header = claimed.header();

        let envelope = match &claimed.envelope {
            Ok(envelope) => envelope.clone(),
            Err(e) => {
                tracing::error!(
                    worker_id = worker_id,
                    job_id = ?header.id,
                    owner_id = ?header.owner_id,
                    error = %e,
                    "Dropping undecodable job"
                );
                self.processor
                    .abandon(header, &JobError::UnsupportedKind)
                    .await;
                return;
            }
        };

        // Own task, so a panic in the pipeline fails this job only
        let processor = self.processor.clone();
        let outcome = tokio::spawn(async move { processor.process(envelope).await }).await;

        if let Err(join_error) = outcome {
            tracing::error!(
                worker_id = worker_id,
                job_id = ?header.id,
                owner_id = ?header.owner_id,
                error = %join_error,
                "Job task aborted"
            );
            self.processor.abandon(header, &JobError::Panicked).await;
        }
    }
}
