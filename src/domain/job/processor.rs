use super::error::JobError;
use super::model::{EnvelopeHeader, JobEnvelope, JobPayload};
use crate::domain::preferences::Preferences;
use crate::domain::rate_limit::RateLimiter;
use crate::domain::shared::OwnerId;
use crate::domain::sources::{DocumentExtractor, SourceError, TextEnhancer, Transcriber};
use crate::domain::status::{JobStatus, StatusReporter};
use crate::domain::tts::{
    detect_language, normalize_text, split, AudioArtifact, AudioAssembler, AudioSegment,
    SynthesisRequest,
};
use crate::infrastructure::repositories::{effective_chunk_limit, TtsRepository};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const LOST_JOB_MESSAGE: &str = "❌ Your request could not be processed. Please send it again.";

/// Collaborators that turn a payload into plain text
pub struct TextSources {
    pub enhancer: Arc<dyn TextEnhancer>,
    pub extractor: Arc<dyn DocumentExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
}

/// Runs one claimed job to a terminal state: delivered audio or an error
/// message, with the status message removed either way.
pub struct JobProcessor {
    tts: Arc<dyn TtsRepository>,
    assembler: Arc<dyn AudioAssembler>,
    reporter: Arc<dyn StatusReporter>,
    sources: TextSources,
    rate_limiter: Arc<RateLimiter>,
    chunk_limit: usize,
    source_timeout: Duration,
}

struct ResolvedText {
    text: String,
    caption: Option<String>,
}

impl JobProcessor {
    pub fn new(
        tts: Arc<dyn TtsRepository>,
        assembler: Arc<dyn AudioAssembler>,
        reporter: Arc<dyn StatusReporter>,
        sources: TextSources,
        rate_limiter: Arc<RateLimiter>,
        configured_chunk_chars: usize,
        source_timeout: Duration,
    ) -> Self {
        let chunk_limit = effective_chunk_limit(configured_chunk_chars, tts.as_ref());
        if chunk_limit < configured_chunk_chars {
            tracing::warn!(
                configured = configured_chunk_chars,
                effective = chunk_limit,
                provider = tts.name(),
                "Chunk size lowered to stay under the provider ceiling"
            );
        }

        Self {
            tts,
            assembler,
            reporter,
            sources,
            rate_limiter,
            chunk_limit,
            source_timeout,
        }
    }

    pub fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }

    /// Process a job and report the outcome to its owner.
    ///
    /// Errors are returned after the owner has been told, for the caller to
    /// record; nothing is left to clean up.
    pub async fn process(&self, envelope: JobEnvelope) -> Result<(), JobError> {
        let start_time = std::time::Instant::now();
        let JobEnvelope {
            id,
            owner_id,
            payload,
            status_handle,
            preferences,
            enqueued_at,
        } = envelope;

        let kind = payload.kind();
        tracing::info!(
            job_id = %id,
            owner_id = %owner_id,
            kind = kind,
            queued_ms = (chrono::Utc::now() - enqueued_at).num_milliseconds(),
            "Processing job"
        );

        let mut status = JobStatus::new(self.reporter.clone(), id, owner_id.clone(), status_handle);

        let result = self
            .run(id, &owner_id, payload, &preferences, &mut status)
            .await;

        match &result {
            Ok(()) => {
                tracing::info!(
                    job_id = %id,
                    owner_id = %owner_id,
                    kind = kind,
                    latency_ms = start_time.elapsed().as_millis() as u64,
                    "Job delivered"
                );
            }
            Err(e) => {
                tracing::error!(
                    job_id = %id,
                    owner_id = %owner_id,
                    kind = kind,
                    error = %e,
                    "Job failed"
                );
                status.fail(e.user_message()).await;
            }
        }

        result
    }

    async fn run(
        &self,
        job_id: Uuid,
        owner: &OwnerId,
        payload: JobPayload,
        preferences: &Preferences,
        status: &mut JobStatus,
    ) -> Result<(), JobError> {
        let resolved = self.resolve_text(job_id, owner, payload).await?;

        let text = normalize_text(&resolved.text);
        if text.is_empty() {
            return Err(JobError::EmptyText);
        }

        let chunks = split(&text, self.chunk_limit);
        let total = chunks.len();
        let voice = match &preferences.voice {
            Some(voice) => voice.clone(),
            None => self.tts.default_voice(detect_language(&text)).to_string(),
        };

        tracing::info!(
            job_id = %job_id,
            text_length = text.chars().count(),
            chunk_count = total,
            chunk_limit = self.chunk_limit,
            voice = %voice,
            "Text split into chunks"
        );

        let mut segments = Vec::with_capacity(total);
        for chunk in chunks {
            let request = SynthesisRequest {
                text: chunk.text,
                voice: voice.clone(),
                speed: preferences.speed,
                style: preferences.style_instructions.clone(),
            };

            let bytes = self
                .tts
                .synthesize(&request)
                .await
                .map_err(|source| JobError::Synthesis {
                    chunk_index: chunk.index,
                    source,
                })?;

            tracing::debug!(
                job_id = %job_id,
                chunk_index = chunk.index,
                is_last = chunk.is_last,
                audio_size_bytes = bytes.len(),
                "Chunk synthesized"
            );

            segments.push(AudioSegment {
                index: chunk.index,
                bytes,
            });
            status.progress(chunk.index + 1, total).await;
        }

        let audio: AudioArtifact = self
            .assembler
            .assemble(segments, self.tts.container())
            .await?;

        status.deliver(audio, resolved.caption).await?;
        Ok(())
    }

    async fn resolve_text(
        &self,
        job_id: Uuid,
        owner: &OwnerId,
        payload: JobPayload,
    ) -> Result<ResolvedText, JobError> {
        match payload {
            JobPayload::PlainText { text } => Ok(ResolvedText {
                text,
                caption: None,
            }),
            JobPayload::EnhancedText { text } => Ok(ResolvedText {
                text: self.enhance_or_keep(job_id, text).await,
                caption: None,
            }),
            JobPayload::Document { file } => {
                let text = self
                    .bounded(self.sources.extractor.extract(&file))
                    .await?;
                self.count_late_characters(job_id, owner, &text).await;
                Ok(ResolvedText {
                    text,
                    caption: file.file_name,
                })
            }
            JobPayload::VoiceTranscript { file } => {
                let text = self
                    .bounded(self.sources.transcriber.transcribe(&file))
                    .await?;
                self.count_late_characters(job_id, owner, &text).await;
                Ok(ResolvedText {
                    text: self.enhance_or_keep(job_id, text).await,
                    caption: None,
                })
            }
            JobPayload::Unsupported => Err(JobError::UnsupportedKind),
        }
    }

    /// Enhancement only improves listening quality; failing it is not fatal
    async fn enhance_or_keep(&self, job_id: Uuid, text: String) -> String {
        match self.bounded(self.sources.enhancer.enhance(&text)).await {
            Ok(enhanced) => enhanced,
            Err(e) => {
                tracing::warn!(
                    job_id = %job_id,
                    error = %e,
                    "Enhancement failed, using original text"
                );
                text
            }
        }
    }

    /// Run a text source call under the source timeout
    async fn bounded<F>(&self, call: F) -> Result<String, SourceError>
    where
        F: Future<Output = Result<String, SourceError>>,
    {
        tokio::time::timeout(self.source_timeout, call)
            .await
            .unwrap_or(Err(SourceError::Timeout(self.source_timeout)))
    }

    async fn count_late_characters(&self, job_id: Uuid, owner: &OwnerId, text: &str) {
        let weight = text.chars().count() as i64;
        if let Err(e) = self.rate_limiter.add_characters(owner, weight).await {
            tracing::warn!(
                job_id = %job_id,
                owner_id = %owner,
                weight = weight,
                error = %e,
                "Could not record extracted characters"
            );
        }
    }

    /// Tell the owner about a job that could not run at all: an envelope that
    /// failed to decode or a processing task that panicked
    pub async fn abandon(&self, header: EnvelopeHeader, reason: &JobError) {
        let job_id = header.id.unwrap_or_else(Uuid::nil);
        let message = match reason {
            JobError::Panicked => reason.user_message(),
            _ => LOST_JOB_MESSAGE,
        };

        match (header.owner_id, header.status_handle) {
            (Some(owner), Some(handle)) => {
                JobStatus::new(self.reporter.clone(), job_id, owner, handle)
                    .fail(message)
                    .await;
            }
            (Some(owner), None) => {
                if let Err(e) = self.reporter.post(&owner, message).await {
                    tracing::error!(
                        job_id = %job_id,
                        owner_id = %owner,
                        error = %e,
                        "Failed to send error message to owner"
                    );
                }
            }
            (None, _) => {
                tracing::error!(job_id = %job_id, "Abandoned job has no owner, nobody to notify");
            }
        }
    }
}
