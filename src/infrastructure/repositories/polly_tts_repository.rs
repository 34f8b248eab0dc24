use super::tts_repository::TtsRepository;
use crate::domain::tts::{AudioContainer, LanguageCode, SynthesisError, SynthesisRequest};
use async_trait::async_trait;
use aws_sdk_polly::{
    error::SdkError,
    types::{Engine, OutputFormat, TextType, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly has a limit of 3000 billed characters per request
const MAX_INPUT_CHARS: usize = 3000;

/// Whole SSML document, tags and entities included
const MAX_REQUEST_CHARS: usize = 6000;

const SSML_CLOSE: &str = "</prosody></speak>";

/// Range accepted by SSML `<prosody rate>` on neural voices
const MIN_RATE_PERCENT: i32 = 20;
const MAX_RATE_PERCENT: i32 = 200;

/// AWS Polly implementation of TTS repository
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
}

impl PollyTtsRepository {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }

    /// Select the appropriate Polly voice for a language
    fn get_voice_for_language(language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "Joanna",
            LanguageCode::Spanish => "Lupe",
            LanguageCode::French => "Lea",
            LanguageCode::German => "Vicki",
            LanguageCode::Italian => "Bianca",
            LanguageCode::Portuguese => "Ines",
        }
    }
}

/// Wrap text in SSML so speed can be expressed as a prosody rate.
///
/// When escaping would push the document past the request limit, markup
/// characters are read as pauses instead of being escaped.
fn to_ssml(text: &str, speed: f32) -> String {
    let rate = ((speed * 100.0).round() as i32).clamp(MIN_RATE_PERCENT, MAX_RATE_PERCENT);
    let open = format!("<speak><prosody rate=\"{}%\">", rate);
    let budget = MAX_REQUEST_CHARS.saturating_sub(open.len() + SSML_CLOSE.len());

    let mut body = escape_xml(text);
    if body.chars().count() > budget {
        tracing::warn!(
            text_length = text.chars().count(),
            escaped_length = body.chars().count(),
            "Escaped SSML too long for Polly, dropping markup characters"
        );
        body = text
            .chars()
            .map(|c| if matches!(c, '&' | '<' | '>') { ' ' } else { c })
            .collect();
    }

    format!("{}{}{}", open, body, SSML_CLOSE)
}

/// Element content only needs the three markup characters escaped
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn is_transient_status(status: u16) -> bool {
    status == 429 || status >= 500
}

fn classify_sdk_error<E, R>(error: &SdkError<E, R>, status: Option<u16>) -> SynthesisError
where
    E: std::fmt::Debug,
    R: std::fmt::Debug,
{
    let detail = format!("AWS Polly error: {:?}", error);
    match error {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            SynthesisError::Transient(detail)
        }
        SdkError::ServiceError(_) if status.is_some_and(is_transient_status) => {
            SynthesisError::Transient(detail)
        }
        _ => SynthesisError::Terminal(detail),
    }
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();
        let characters_count = request.text.chars().count();
        let voice_id = VoiceId::from(request.voice.as_str());
        let engine = Engine::Neural;

        if request.style.is_some() {
            tracing::debug!("Polly has no style instructions, ignoring them");
        }

        tracing::debug!(
            voice = %request.voice,
            engine = ?engine,
            speed = request.speed,
            output_format = "Mp3",
            text_length = characters_count,
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(to_ssml(&request.text, request.speed))
            .text_type(TextType::Ssml)
            .voice_id(voice_id)
            .output_format(OutputFormat::Mp3)
            .engine(engine)
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|raw| raw.status().as_u16());
                let error = classify_sdk_error(&e, status);
                tracing::error!(
                    error = %e,
                    status = ?status,
                    retryable = error.is_retryable(),
                    voice = %request.voice,
                    text_length = characters_count,
                    "AWS Polly synthesize_speech failed"
                );
                error
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            SynthesisError::Transient(format!("Failed to read audio stream: {}", e))
        })?;

        let audio_data = audio_stream.into_bytes().to_vec();

        let duration = start_time.elapsed();
        let throughput_chars_per_sec = if duration.as_secs_f64() > 0.0 {
            characters_count as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        tracing::info!(
            provider = "polly",
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
        AudioContainer::Mp3
    }

    fn default_voice(&self, language: LanguageCode) -> &'static str {
        Self::get_voice_for_language(language)
    }

    fn name(&self) -> &'static str {
        "polly"
    }
}
