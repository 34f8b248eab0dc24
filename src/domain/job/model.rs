use crate::domain::preferences::Preferences;
use crate::domain::shared::OwnerId;
use crate::domain::sources::FileRef;
use crate::domain::status::StatusHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a job synthesizes, and what has to happen to it first.
///
/// Envelopes written by a newer version may carry kinds this build does not
/// know; they decode as `Unsupported` and fail the job instead of the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    /// Synthesized as submitted
    PlainText { text: String },
    /// Run through the AI enhancement pass before synthesis
    EnhancedText { text: String },
    /// Extracted to plain text first
    Document { file: FileRef },
    /// Transcribed, then enhanced
    VoiceTranscript { file: FileRef },
    #[serde(other)]
    Unsupported,
}

impl JobPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            JobPayload::PlainText { .. } => "plain_text",
            JobPayload::EnhancedText { .. } => "enhanced_text",
            JobPayload::Document { .. } => "document",
            JobPayload::VoiceTranscript { .. } => "voice_transcript",
            JobPayload::Unsupported => "unsupported",
        }
    }

    /// Characters known at admission. File-sourced jobs are weighed by the
    /// worker once their text exists.
    pub fn admission_weight(&self) -> i64 {
        match self {
            JobPayload::PlainText { text } | JobPayload::EnhancedText { text } => {
                text.chars().count() as i64
            }
            _ => 0,
        }
    }
}

/// Queued unit of work, serialized as JSON in the shared store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub payload: JobPayload,
    pub status_handle: StatusHandle,
    pub preferences: Preferences,
    pub enqueued_at: DateTime<Utc>,
}

impl JobEnvelope {
    pub fn new(
        owner_id: OwnerId,
        payload: JobPayload,
        status_handle: StatusHandle,
        preferences: Preferences,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            payload,
            status_handle,
            preferences,
            enqueued_at: Utc::now(),
        }
    }
}

/// Whatever could be recovered from an envelope that failed to decode,
/// enough to tell the owner their job was lost
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvelopeHeader {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub owner_id: Option<OwnerId>,
    #[serde(default)]
    pub status_handle: Option<StatusHandle>,
}

impl EnvelopeHeader {
    /// Never fails; unreadable fields are simply absent
    pub fn parse_lenient(raw: &str) -> Self {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            return Self::default();
        };
        Self {
            id: field(&value, "id"),
            owner_id: field(&value, "owner_id"),
            status_handle: field(&value, "status_handle"),
        }
    }
}

fn field<T: serde::de::DeserializeOwned>(value: &serde_json::Value, name: &str) -> Option<T> {
    value
        .get(name)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

impl From<&JobEnvelope> for EnvelopeHeader {
    fn from(envelope: &JobEnvelope) -> Self {
        Self {
            id: Some(envelope.id),
            owner_id: Some(envelope.owner_id.clone()),
            status_handle: Some(envelope.status_handle.clone()),
        }
    }
}
