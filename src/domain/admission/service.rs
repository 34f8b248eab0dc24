use super::dto::{SubmitJobRequest, SubmitJobResponse};
use super::error::AdmissionError;
use crate::domain::job::{JobEnvelope, JobPayload};
use crate::domain::rate_limit::RateLimiter;
use crate::domain::shared::usage_dto::{UsageLimits, UsageResponse, UsageStats};
use crate::domain::shared::OwnerId;
use crate::domain::status::StatusReporter;
use crate::infrastructure::queue::JobQueue;
use crate::infrastructure::repositories::PreferencesRepository;
use std::sync::Arc;

const QUEUED_STATUS: &str = "⏳ Queued, your audio will be ready soon…";

/// Front door of the pipeline: validates a request, applies the rate limits,
/// snapshots preferences, opens the status message and enqueues the job.
///
/// Never waits for the job itself.
pub struct AdmissionService {
    rate_limiter: Arc<RateLimiter>,
    preferences: Arc<dyn PreferencesRepository>,
    reporter: Arc<dyn StatusReporter>,
    queue: Arc<JobQueue>,
    max_text_chars: usize,
}

impl AdmissionService {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        preferences: Arc<dyn PreferencesRepository>,
        reporter: Arc<dyn StatusReporter>,
        queue: Arc<JobQueue>,
        max_text_chars: usize,
    ) -> Self {
        Self {
            rate_limiter,
            preferences,
            reporter,
            queue,
            max_text_chars,
        }
    }

    pub async fn submit(
        &self,
        owner: &OwnerId,
        request: SubmitJobRequest,
    ) -> Result<SubmitJobResponse, AdmissionError> {
        let payload = self.validate(request)?;
        let weight = payload.admission_weight();

        let decision = self.rate_limiter.check(owner, weight).await?;
        if !decision.allowed {
            if let Some(reason) = decision.reason {
                return Err(AdmissionError::RateLimited(reason));
            }
        }

        let preferences = self.preferences.snapshot(owner).await?;
        let status_handle = self.reporter.post(owner, QUEUED_STATUS).await?;

        let envelope = JobEnvelope::new(owner.clone(), payload, status_handle, preferences);
        if let Err(e) = self.queue.enqueue(&envelope).await {
            if let Err(delete_error) = self.reporter.delete(&envelope.status_handle).await {
                tracing::warn!(
                    owner_id = %owner,
                    error = %delete_error,
                    "Failed to delete status message of rejected job"
                );
            }
            return Err(e.into());
        }

        // Enqueued: from here on the job runs whatever happens below
        if let Err(e) = self.rate_limiter.increment(owner, weight).await {
            tracing::error!(
                job_id = %envelope.id,
                owner_id = %owner,
                weight = weight,
                error = %e,
                "Failed to count accepted job"
            );
        }

        let notice_sent = decision.notify && self.send_budget_notice(owner).await;

        tracing::info!(
            job_id = %envelope.id,
            owner_id = %owner,
            kind = envelope.payload.kind(),
            weight = weight,
            over_budget = decision.reason.is_some(),
            notice_sent = notice_sent,
            "Job accepted"
        );

        Ok(SubmitJobResponse {
            job_id: envelope.id,
            notice_sent,
        })
    }

    pub async fn usage(&self, owner: &OwnerId) -> Result<UsageResponse, AdmissionError> {
        let snapshot = self.rate_limiter.usage(owner).await?;
        let limits = self.rate_limiter.limits();

        Ok(UsageResponse {
            usage: UsageStats {
                requests_this_minute: snapshot.requests_this_minute,
                characters_today: snapshot.characters_today,
                notified_today: snapshot.notified_today,
            },
            limits: UsageLimits {
                requests_per_minute: limits.requests_per_minute,
                characters_per_day: limits.characters_per_day,
            },
            day_resets_at: self.rate_limiter.day_resets_at(),
        })
    }

    fn validate(&self, request: SubmitJobRequest) -> Result<JobPayload, AdmissionError> {
        let SubmitJobRequest { kind, text, file } = request;

        let inline_text = |text: Option<String>| -> Result<String, AdmissionError> {
            let text = text.unwrap_or_default();
            if text.trim().is_empty() {
                return Err(AdmissionError::EmptyText);
            }
            let length = text.chars().count();
            if length > self.max_text_chars {
                return Err(AdmissionError::TextTooLong {
                    length,
                    max: self.max_text_chars,
                });
            }
            Ok(text)
        };

        match kind.as_str() {
            "plain_text" => Ok(JobPayload::PlainText {
                text: inline_text(text)?,
            }),
            "enhanced_text" => Ok(JobPayload::EnhancedText {
                text: inline_text(text)?,
            }),
            "document" => Ok(JobPayload::Document {
                file: file.ok_or(AdmissionError::MissingFile(kind))?,
            }),
            "voice_transcript" => Ok(JobPayload::VoiceTranscript {
                file: file.ok_or(AdmissionError::MissingFile(kind))?,
            }),
            _ => Err(AdmissionError::UnknownKind(kind)),
        }
    }

    /// Best-effort: a notice that cannot be sent is retried on the next request
    async fn send_budget_notice(&self, owner: &OwnerId) -> bool {
        let limits = self.rate_limiter.limits();
        let notice = format!(
            "⚠️ You have used today's budget of {} characters. Your requests are still being processed.",
            limits.characters_per_day
        );

        if let Err(e) = self.reporter.post(owner, &notice).await {
            tracing::warn!(owner_id = %owner, error = %e, "Failed to send daily budget notice");
            return false;
        }

        if let Err(e) = self.rate_limiter.mark_notified(owner).await {
            tracing::warn!(owner_id = %owner, error = %e, "Failed to record daily budget notice");
        }
        true
    }
}
