use super::reporter::{ReporterError, StatusHandle, StatusReporter};
use crate::domain::shared::OwnerId;
use crate::domain::tts::AudioArtifact;
use std::sync::Arc;
use uuid::Uuid;

/// The status message of one running job.
///
/// Progress updates, status removal and the final error notice are
/// best-effort: a failure is logged and swallowed. Audio delivery is fatal
/// and returns its error. The status message is always removed before the
/// audio or the error notice goes out.
pub struct JobStatus {
    reporter: Arc<dyn StatusReporter>,
    job_id: Uuid,
    owner: OwnerId,
    handle: Option<StatusHandle>,
}

impl JobStatus {
    pub fn new(
        reporter: Arc<dyn StatusReporter>,
        job_id: Uuid,
        owner: OwnerId,
        handle: StatusHandle,
    ) -> Self {
        Self {
            reporter,
            job_id,
            owner,
            handle: Some(handle),
        }
    }

    /// Report `current/total` chunk progress. Single-chunk jobs stay quiet.
    pub async fn progress(&self, current: usize, total: usize) {
        if total <= 1 {
            return;
        }
        let Some(handle) = &self.handle else {
            return;
        };

        let text = format!("🎙 Synthesizing… {}/{}", current, total);
        if let Err(e) = self.reporter.update(handle, &text).await {
            tracing::debug!(
                job_id = %self.job_id,
                error = %e,
                "Progress update failed, continuing"
            );
        }
    }

    /// Remove the status message if it is still there
    pub async fn clear(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        if let Err(e) = self.reporter.delete(&handle).await {
            tracing::warn!(
                job_id = %self.job_id,
                owner_id = %self.owner,
                error = %e,
                "Failed to delete status message"
            );
        }
    }

    pub async fn deliver(
        &mut self,
        audio: AudioArtifact,
        caption: Option<String>,
    ) -> Result<(), ReporterError> {
        self.clear().await;
        self.reporter.deliver_audio(&self.owner, audio, caption).await
    }

    pub async fn fail(&mut self, message: &str) {
        self.clear().await;

        if let Err(e) = self.reporter.post(&self.owner, message).await {
            tracing::error!(
                job_id = %self.job_id,
                owner_id = %self.owner,
                error = %e,
                "Failed to send error message to owner"
            );
        }
    }
}
