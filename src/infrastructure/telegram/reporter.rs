use super::client::{MediaKind, TelegramClient};
use crate::domain::shared::OwnerId;
use crate::domain::sources::{FileFetcher, FileRef, SourceError};
use crate::domain::status::{ReporterError, StatusHandle, StatusReporter};
use crate::domain::tts::{AudioArtifact, AudioContainer};
use async_trait::async_trait;
use std::sync::Arc;

/// Talks back to the owner through a Telegram bot.
///
/// Owners are private chats, so the owner id doubles as the chat id.
pub struct TelegramStatusReporter {
    client: Arc<TelegramClient>,
}

impl TelegramStatusReporter {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

fn message_id(handle: &StatusHandle) -> Result<i64, ReporterError> {
    handle
        .message_id
        .parse()
        .map_err(|_| ReporterError::Rejected(format!("invalid message id '{}'", handle.message_id)))
}

fn media_for(container: AudioContainer) -> (MediaKind, String) {
    match container {
        AudioContainer::OggOpus => (MediaKind::Voice, "voice.ogg".to_string()),
        AudioContainer::Mp3 => (MediaKind::Audio, "audio.mp3".to_string()),
    }
}

#[async_trait]
impl StatusReporter for TelegramStatusReporter {
    async fn post(&self, owner: &OwnerId, text: &str) -> Result<StatusHandle, ReporterError> {
        let message = self.client.send_message(owner.as_str(), text).await?;
        Ok(StatusHandle {
            owner_id: owner.clone(),
            message_id: message.message_id.to_string(),
        })
    }

    async fn update(&self, handle: &StatusHandle, text: &str) -> Result<(), ReporterError> {
        let id = message_id(handle)?;
        match self
            .client
            .edit_message_text(handle.owner_id.as_str(), id, text)
            .await
        {
            // Same text twice in a row
            Err(ReporterError::Rejected(message)) if message.contains("message is not modified") => {
                Ok(())
            }
            other => other,
        }
    }

    async fn delete(&self, handle: &StatusHandle) -> Result<(), ReporterError> {
        let id = message_id(handle)?;
        self.client
            .delete_message(handle.owner_id.as_str(), id)
            .await
    }

    async fn deliver_audio(
        &self,
        owner: &OwnerId,
        audio: AudioArtifact,
        caption: Option<String>,
    ) -> Result<(), ReporterError> {
        let (kind, file_name) = media_for(audio.container);
        self.client
            .send_media(
                kind,
                owner.as_str(),
                audio.bytes,
                file_name,
                audio.container.mime_type(),
                caption.as_deref(),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FileFetcher for TelegramStatusReporter {
    async fn fetch(&self, file: &FileRef) -> Result<Vec<u8>, SourceError> {
        let path = self
            .client
            .get_file_path(&file.file_id)
            .await
            .map_err(|e| SourceError::Download(e.to_string()))?;

        let bytes = self
            .client
            .download(&path)
            .await
            .map_err(|e| SourceError::Download(e.to_string()))?;

        tracing::debug!(
            file_id = %file.file_id,
            size_bytes = bytes.len(),
            "Downloaded file from Telegram"
        );
        Ok(bytes)
    }
}
