use crate::domain::shared::OwnerId;
use crate::domain::tts::AudioArtifact;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reference to the single progress message tracked for a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHandle {
    pub owner_id: OwnerId,
    pub message_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    #[error("transport request failed: {0}")]
    Transport(String),
    #[error("transport rejected the request: {0}")]
    Rejected(String),
}

/// Messaging transport used to talk back to the owner.
///
/// Implementations only report failures; deciding which failures matter is
/// the caller's job (see [`super::JobStatus`]).
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn post(&self, owner: &OwnerId, text: &str) -> Result<StatusHandle, ReporterError>;

    async fn update(&self, handle: &StatusHandle, text: &str) -> Result<(), ReporterError>;

    async fn delete(&self, handle: &StatusHandle) -> Result<(), ReporterError>;

    async fn deliver_audio(
        &self,
        owner: &OwnerId,
        audio: AudioArtifact,
        caption: Option<String>,
    ) -> Result<(), ReporterError>;
}
