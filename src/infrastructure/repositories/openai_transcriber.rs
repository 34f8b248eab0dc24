use crate::domain::sources::{FileFetcher, FileRef, SourceError, Transcriber};
use async_openai::{
    config::OpenAIConfig,
    types::{AudioInput, CreateTranscriptionRequestArgs},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Speech-to-text for voice messages
pub struct OpenAiTranscriber {
    client: Arc<Client<OpenAIConfig>>,
    fetcher: Arc<dyn FileFetcher>,
    model: String,
}

impl OpenAiTranscriber {
    pub fn new(client: Arc<Client<OpenAIConfig>>, fetcher: Arc<dyn FileFetcher>, model: String) -> Self {
        Self {
            client,
            fetcher,
            model,
        }
    }
}

/// The API infers the codec from the extension
fn upload_name(file: &FileRef) -> String {
    if let Some(name) = file.file_name.as_deref().filter(|n| n.contains('.')) {
        return name.to_string();
    }
    let extension = match file.mime_type.as_deref() {
        Some("audio/mpeg") => "mp3",
        Some("audio/mp4") | Some("audio/m4a") => "m4a",
        Some("audio/wav") | Some("audio/x-wav") => "wav",
        Some("audio/webm") => "webm",
        _ => "ogg",
    };
    format!("voice.{}", extension)
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, file: &FileRef) -> Result<String, SourceError> {
        let audio = self.fetcher.fetch(file).await?;
        let audio_size = audio.len();
        let start_time = std::time::Instant::now();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(upload_name(file), audio))
            .model(&self.model)
            .build()
            .map_err(|e| SourceError::Provider(e.to_string()))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, model = %self.model, "Transcription failed");
                SourceError::Provider(e.to_string())
            })?;

        tracing::info!(
            model = %self.model,
            audio_size_bytes = audio_size,
            latency_ms = start_time.elapsed().as_millis() as u64,
            text_length = response.text.chars().count(),
            "Voice message transcribed"
        );

        Ok(response.text)
    }
}
