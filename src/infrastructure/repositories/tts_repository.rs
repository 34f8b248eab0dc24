use crate::domain::tts::{AudioContainer, LanguageCode, SynthesisError, SynthesisRequest};
use async_trait::async_trait;

/// Characters kept free below a provider's documented input ceiling
pub const PROVIDER_SAFETY_MARGIN: usize = 96;

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS provider (OpenAI, AWS Polly, etc.)
///
/// Implementations synthesize exactly one chunk per call; splitting and
/// merging belong to the job pipeline. Every failure must be classified as
/// transient or terminal.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize one chunk of text
    ///
    /// Returns raw audio in [`TtsRepository::container`] format
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError>;

    /// Documented hard ceiling on input characters per request
    fn max_input_chars(&self) -> usize;

    fn container(&self) -> AudioContainer;

    /// Voice used when the owner has not picked one
    fn default_voice(&self, language: LanguageCode) -> &'static str;

    fn name(&self) -> &'static str;
}

/// Largest chunk we hand to a provider: the configured size, but never closer
/// to the provider ceiling than the safety margin
pub fn effective_chunk_limit(configured: usize, provider: &dyn TtsRepository) -> usize {
    let ceiling = provider
        .max_input_chars()
        .saturating_sub(PROVIDER_SAFETY_MARGIN)
        .max(1);
    configured.clamp(1, ceiling)
}
