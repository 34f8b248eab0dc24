use super::tts_repository::TtsRepository;
use crate::domain::tts::{AudioContainer, LanguageCode, SynthesisError, SynthesisRequest};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

/// OpenAI has a limit of 4096 characters per request
const MAX_INPUT_CHARS: usize = 4096;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
}

/// OpenAI TTS implementation of TTS repository.
///
/// Talks to `/audio/speech` directly so the request can carry `instructions`
/// and ask for Opus output, which concatenates without re-encoding.
pub struct OpenAiTtsRepository {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiTtsRepository {
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self::with_base_url(http, api_key, model, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(
        http: reqwest::Client,
        api_key: String,
        model: String,
        base_url: String,
    ) -> Self {
        Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Select the appropriate OpenAI voice for a language
    /// Based on voice characteristics that suit each language
    fn get_voice_for_language(language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "alloy", // Neutral American accent
            LanguageCode::Spanish => "echo",  // Warm, clear for Spanish
            LanguageCode::French => "nova",   // Soft, suitable for French
            LanguageCode::German => "onyx",   // Clear, authoritative
            LanguageCode::Italian => "fable", // Expressive for Italian
            LanguageCode::Portuguese => "shimmer", // Clear articulation
        }
    }
}

/// Map a non-success HTTP answer to a retry class
fn classify_status(status: StatusCode, body: &str) -> SynthesisError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, 300));
    match status {
        StatusCode::TOO_MANY_REQUESTS if body.contains("insufficient_quota") => {
            SynthesisError::Terminal(detail)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            SynthesisError::Transient(detail)
        }
        s if s.is_server_error() => SynthesisError::Transient(detail),
        _ => SynthesisError::Terminal(detail),
    }
}

fn classify_transport(error: &reqwest::Error) -> SynthesisError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        SynthesisError::Transient(error.to_string())
    } else {
        SynthesisError::Terminal(error.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

#[async_trait]
impl TtsRepository for OpenAiTtsRepository {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();
        let characters_count = request.text.chars().count();

        tracing::debug!(
            model = %self.model,
            voice = %request.voice,
            speed = request.speed,
            has_style = request.style.is_some(),
            text_length = characters_count,
            text_preview = truncate(&request.text, 200),
            "Calling OpenAI TTS API"
        );

        let body = SpeechBody {
            model: &self.model,
            input: &request.text,
            voice: &request.voice,
            speed: request.speed,
            response_format: "opus",
            instructions: request.style.as_deref(),
        };

        let response = self
            .http
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, model = %self.model, "OpenAI TTS request failed");
                classify_transport(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = classify_status(status, &text);
            tracing::error!(
                status = status.as_u16(),
                retryable = error.is_retryable(),
                model = %self.model,
                voice = %request.voice,
                "OpenAI TTS API call failed"
            );
            return Err(error);
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| classify_transport(&e))?
            .to_vec();

        let duration = start_time.elapsed();
        let throughput_chars_per_sec = if duration.as_secs_f64() > 0.0 {
            characters_count as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        tracing::info!(
            provider = "openai",
            model = %self.model,
            voice = %request.voice,
            latency_ms = duration.as_millis() as u64,
            characters_count = characters_count,
            audio_size_bytes = audio_data.len(),
            throughput_chars_per_sec = format!("{:.2}", throughput_chars_per_sec),
            "TTS synthesis completed"
        );

        Ok(audio_data)
    }

    fn max_input_chars(&self) -> usize {
        MAX_INPUT_CHARS
    }

    fn container(&self) -> AudioContainer {
        AudioContainer::OggOpus
    }

    fn default_voice(&self, language: LanguageCode) -> &'static str {
        Self::get_voice_for_language(language)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
