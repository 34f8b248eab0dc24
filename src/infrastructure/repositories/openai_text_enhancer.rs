use crate::domain::sources::{SourceError, TextEnhancer};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Longer texts are synthesized as they are
const MAX_ENHANCE_CHARS: usize = 12_000;

const SYSTEM_PROMPT: &str = "You prepare text to be read aloud by a speech synthesizer. \
Fix punctuation, casing and obvious typos, expand abbreviations a listener would stumble on, \
and split run-on sentences. Keep the language, the meaning and the wording otherwise intact. \
Never summarize, translate or add commentary. Reply with the prepared text only.";

pub struct OpenAiTextEnhancer {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiTextEnhancer {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }
}

fn provider_error(error: impl std::fmt::Display) -> SourceError {
    SourceError::Provider(error.to_string())
}

#[async_trait]
impl TextEnhancer for OpenAiTextEnhancer {
    async fn enhance(&self, text: &str) -> Result<String, SourceError> {
        let text_length = text.chars().count();
        if text_length > MAX_ENHANCE_CHARS {
            tracing::debug!(
                text_length = text_length,
                max = MAX_ENHANCE_CHARS,
                "Text too long for enhancement, skipping"
            );
            return Ok(text.to_string());
        }

        let start_time = std::time::Instant::now();
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.0)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(provider_error)?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(text)
                    .build()
                    .map_err(provider_error)?
                    .into(),
            ])
            .build()
            .map_err(provider_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(provider_error)?;

        let enhanced = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| SourceError::Provider("empty completion".to_string()))?;

        tracing::info!(
            model = %self.model,
            latency_ms = start_time.elapsed().as_millis() as u64,
            input_chars = text_length,
            output_chars = enhanced.chars().count(),
            "Text enhanced"
        );

        Ok(enhanced)
    }
}
