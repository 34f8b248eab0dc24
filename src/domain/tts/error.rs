/// Failure reported by a synthesis provider.
///
/// Providers classify their own failures; callers only decide how many
/// transient failures to tolerate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// Overload, timeout, connection reset. Worth another attempt.
    #[error("transient provider failure: {0}")]
    Transient(String),
    /// Bad credentials, malformed input, exhausted quota.
    #[error("provider rejected the request: {0}")]
    Terminal(String),
}

impl SynthesisError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SynthesisError::Transient(_))
    }
}
