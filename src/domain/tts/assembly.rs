use super::dto::{AudioArtifact, AudioContainer, AudioSegment};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("no audio segments to assemble")]
    Empty,
    #[error("audio segments are not contiguous: expected index {expected}, found {found}")]
    MissingSegment { expected: usize, found: usize },
    #[error("scratch storage error: {0}")]
    Scratch(#[from] std::io::Error),
    #[error("concatenation tool could not run: {0}")]
    Spawn(String),
    #[error("concatenation tool timed out after {0} seconds")]
    Timeout(u64),
    #[error("concatenation tool exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },
}

/// Joins per-chunk audio into one playable artifact, in chunk index order
#[async_trait]
pub trait AudioAssembler: Send + Sync {
    async fn assemble(
        &self,
        segments: Vec<AudioSegment>,
        container: AudioContainer,
    ) -> Result<AudioArtifact, AssemblyError>;
}

/// Sort segments by chunk index and verify they cover `0..n` exactly once
pub fn order_segments(mut segments: Vec<AudioSegment>) -> Result<Vec<AudioSegment>, AssemblyError> {
    if segments.is_empty() {
        return Err(AssemblyError::Empty);
    }

    segments.sort_by_key(|segment| segment.index);
    for (expected, segment) in segments.iter().enumerate() {
        if segment.index != expected {
            return Err(AssemblyError::MissingSegment {
                expected,
                found: segment.index,
            });
        }
    }

    Ok(segments)
}
