use super::tts_repository::TtsRepository;
use crate::domain::tts::{AudioContainer, LanguageCode, SynthesisError, SynthesisRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound on a single provider call
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base, 2×base, 4×base…
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1).min(16));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Retries transient provider failures with exponential backoff.
///
/// Terminal failures pass through on the first occurrence; a transient
/// failure on the last attempt is escalated to terminal.
pub struct RetryingTtsRepository {
    inner: Arc<dyn TtsRepository>,
    policy: RetryPolicy,
}

impl RetryingTtsRepository {
    pub fn new(inner: Arc<dyn TtsRepository>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn attempt(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        match tokio::time::timeout(self.policy.attempt_timeout, self.inner.synthesize(request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SynthesisError::Transient(format!(
                "no response within {} seconds",
                self.policy.attempt_timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl TtsRepository for RetryingTtsRepository {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(request).await {
                Ok(audio) => return Ok(audio),
                Err(SynthesisError::Transient(reason)) if attempt < max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        provider = self.inner.name(),
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Transient synthesis failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(SynthesisError::Transient(reason)) => {
                    return Err(SynthesisError::Terminal(format!(
                        "gave up after {} attempts: {}",
                        attempt, reason
                    )));
                }
                Err(terminal) => return Err(terminal),
            }
        }
    }

    fn max_input_chars(&self) -> usize {
        self.inner.max_input_chars()
    }

    fn container(&self) -> AudioContainer {
        self.inner.container()
    }

    fn default_voice(&self, language: LanguageCode) -> &'static str {
        self.inner.default_voice(language)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
