//! In-memory collaborators for job pipeline tests

use super::model::{JobEnvelope, JobPayload};
use super::processor::{JobProcessor, TextSources};
use crate::domain::preferences::Preferences;
use crate::domain::rate_limit::{RateLimiter, RateLimits, SystemClock};
use crate::domain::shared::OwnerId;
use crate::domain::sources::{DocumentExtractor, FileRef, SourceError, TextEnhancer, Transcriber};
use crate::domain::status::{ReporterError, StatusHandle, StatusReporter};
use crate::domain::tts::{
    order_segments, AssemblyError, AudioArtifact, AudioAssembler, AudioContainer, AudioSegment,
    LanguageCode, SynthesisError, SynthesisRequest,
};
use crate::infrastructure::repositories::TtsRepository;
use crate::infrastructure::store::MemoryStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub const SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Echoes each chunk back as `[text]`
#[derive(Default)]
pub struct FakeTts {
    calls: Mutex<Vec<SynthesisRequest>>,
    failure: Mutex<Option<(String, SynthesisError)>>,
}

impl FakeTts {
    pub fn calls(&self) -> Vec<SynthesisRequest> {
        self.calls.lock().clone()
    }

    /// Fail every chunk containing `needle`
    pub fn fail_on(&self, needle: &str, error: SynthesisError) {
        *self.failure.lock() = Some((needle.to_string(), error));
    }
}

#[async_trait]
impl TtsRepository for FakeTts {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        self.calls.lock().push(request.clone());
        if let Some((needle, error)) = self.failure.lock().as_ref() {
            if request.text.contains(needle.as_str()) {
                return Err(error.clone());
            }
        }
        Ok(format!("[{}]", request.text).into_bytes())
    }

    fn max_input_chars(&self) -> usize {
        4096
    }

    fn container(&self) -> AudioContainer {
        AudioContainer::OggOpus
    }

    fn default_voice(&self, language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "voice-en",
            LanguageCode::Spanish => "voice-es",
            LanguageCode::French => "voice-fr",
            LanguageCode::German => "voice-de",
            LanguageCode::Italian => "voice-it",
            LanguageCode::Portuguese => "voice-pt",
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Post(String, String),
    Update(String, String),
    Delete(String),
    Deliver { bytes: Vec<u8>, caption: Option<String> },
}

#[derive(Default)]
pub struct FakeReporter {
    events: Mutex<Vec<Event>>,
    next_message: Mutex<u32>,
    fail_updates: Mutex<bool>,
    fail_deliveries: Mutex<bool>,
}

impl FakeReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn deliveries(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Event::Deliver { .. }))
            .count()
    }

    pub fn fail_updates(&self) {
        *self.fail_updates.lock() = true;
    }

    pub fn fail_deliveries(&self) {
        *self.fail_deliveries.lock() = true;
    }
}

#[async_trait]
impl StatusReporter for FakeReporter {
    async fn post(&self, owner: &OwnerId, text: &str) -> Result<StatusHandle, ReporterError> {
        let message_id = {
            let mut next = self.next_message.lock();
            *next += 1;
            format!("msg-{}", *next)
        };
        self.events
            .lock()
            .push(Event::Post(owner.to_string(), text.to_string()));
        Ok(StatusHandle {
            owner_id: owner.clone(),
            message_id,
        })
    }

    async fn update(&self, handle: &StatusHandle, text: &str) -> Result<(), ReporterError> {
        if *self.fail_updates.lock() {
            return Err(ReporterError::Transport("connection reset".to_string()));
        }
        self.events
            .lock()
            .push(Event::Update(handle.message_id.clone(), text.to_string()));
        Ok(())
    }

    async fn delete(&self, handle: &StatusHandle) -> Result<(), ReporterError> {
        self.events
            .lock()
            .push(Event::Delete(handle.message_id.clone()));
        Ok(())
    }

    async fn deliver_audio(
        &self,
        _owner: &OwnerId,
        audio: AudioArtifact,
        caption: Option<String>,
    ) -> Result<(), ReporterError> {
        if *self.fail_deliveries.lock() {
            return Err(ReporterError::Rejected("file too large".to_string()));
        }
        self.events.lock().push(Event::Deliver {
            bytes: audio.bytes,
            caption,
        });
        Ok(())
    }
}

/// Upper-cases the text
#[derive(Default)]
pub struct FakeEnhancer {
    failing: Mutex<bool>,
    hanging: Mutex<bool>,
}

impl FakeEnhancer {
    pub fn fail(&self) {
        *self.failing.lock() = true;
    }

    /// Never answer
    pub fn hang(&self) {
        *self.hanging.lock() = true;
    }
}

#[async_trait]
impl TextEnhancer for FakeEnhancer {
    async fn enhance(&self, text: &str) -> Result<String, SourceError> {
        let hanging = *self.hanging.lock();
        if hanging {
            std::future::pending::<()>().await;
        }
        if *self.failing.lock() {
            return Err(SourceError::Provider("model overloaded".to_string()));
        }
        Ok(text.to_uppercase())
    }
}

/// Serves canned document text and transcripts
#[derive(Default)]
pub struct FakeSources {
    document: Mutex<Option<Result<String, SourceError>>>,
    transcript: Mutex<Option<String>>,
    hanging: Mutex<bool>,
}

impl FakeSources {
    pub fn set_document(&self, text: &str) {
        *self.document.lock() = Some(Ok(text.to_string()));
    }

    pub fn fail_extraction(&self, error: SourceError) {
        *self.document.lock() = Some(Err(error));
    }

    pub fn set_transcript(&self, text: &str) {
        *self.transcript.lock() = Some(text.to_string());
    }

    /// Extraction and transcription never answer
    pub fn hang(&self) {
        *self.hanging.lock() = true;
    }

    async fn stall_if_hanging(&self) {
        let hanging = *self.hanging.lock();
        if hanging {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl DocumentExtractor for FakeSources {
    async fn extract(&self, file: &FileRef) -> Result<String, SourceError> {
        self.stall_if_hanging().await;
        match self.document.lock().take() {
            Some(result) => result,
            None => Err(SourceError::Download(file.file_id.clone())),
        }
    }
}

#[async_trait]
impl Transcriber for FakeSources {
    async fn transcribe(&self, file: &FileRef) -> Result<String, SourceError> {
        self.stall_if_hanging().await;
        self.transcript
            .lock()
            .clone()
            .ok_or_else(|| SourceError::Download(file.file_id.clone()))
    }
}

/// Concatenates bytes in index order
#[derive(Default)]
pub struct FakeAssembler {
    last_container: Mutex<Option<AudioContainer>>,
}

impl FakeAssembler {
    pub fn last_container(&self) -> Option<AudioContainer> {
        *self.last_container.lock()
    }
}

#[async_trait]
impl AudioAssembler for FakeAssembler {
    async fn assemble(
        &self,
        segments: Vec<AudioSegment>,
        container: AudioContainer,
    ) -> Result<AudioArtifact, AssemblyError> {
        *self.last_container.lock() = Some(container);
        let bytes = order_segments(segments)?
            .into_iter()
            .flat_map(|segment| segment.bytes)
            .collect();
        Ok(AudioArtifact { bytes, container })
    }
}

pub struct Harness {
    pub tts: Arc<FakeTts>,
    pub reporter: Arc<FakeReporter>,
    pub enhancer: Arc<FakeEnhancer>,
    pub sources: Arc<FakeSources>,
    pub assembler: Arc<FakeAssembler>,
    pub store: Arc<MemoryStore>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let rate_limiter = Arc::new(RateLimiter::new(
            store.clone(),
            RateLimits::default(),
            Arc::new(SystemClock),
        ));
        Self {
            tts: Arc::new(FakeTts::default()),
            reporter: Arc::new(FakeReporter::default()),
            enhancer: Arc::new(FakeEnhancer::default()),
            sources: Arc::new(FakeSources::default()),
            assembler: Arc::new(FakeAssembler::default()),
            store,
            rate_limiter,
        }
    }

    pub fn processor(&self, chunk_chars: usize) -> JobProcessor {
        JobProcessor::new(
            self.tts.clone(),
            self.assembler.clone(),
            self.reporter.clone(),
            TextSources {
                enhancer: self.enhancer.clone(),
                extractor: self.sources.clone(),
                transcriber: self.sources.clone(),
            },
            self.rate_limiter.clone(),
            chunk_chars,
            SOURCE_TIMEOUT,
        )
    }

    pub fn envelope(&self, payload: JobPayload) -> JobEnvelope {
        JobEnvelope::new(
            "owner-1".into(),
            payload,
            StatusHandle {
                owner_id: "owner-1".into(),
                message_id: "status-1".to_string(),
            },
            Preferences::default(),
        )
    }
}
