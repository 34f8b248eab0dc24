use crate::domain::sources::SourceError;
use crate::domain::status::ReporterError;
use crate::domain::tts::{AssemblyError, SynthesisError};

/// Terminal failure of a claimed job
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("unsupported job kind")]
    UnsupportedKind,
    #[error("no text left to synthesize")]
    EmptyText,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("chunk {chunk_index} failed: {source}")]
    Synthesis {
        chunk_index: usize,
        #[source]
        source: SynthesisError,
    },
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error("audio delivery failed: {0}")]
    Delivery(#[from] ReporterError),
    #[error("job panicked")]
    Panicked,
}

impl JobError {
    /// Short text shown to the owner; details stay in the logs
    pub fn user_message(&self) -> &'static str {
        match self {
            JobError::UnsupportedKind => "❌ This kind of request is not supported.",
            JobError::EmptyText => "❌ There is no text to read aloud.",
            JobError::Source(SourceError::UnsupportedFormat(_)) => {
                "❌ This file format is not supported. Send plain text, Markdown or HTML."
            }
            JobError::Source(SourceError::Download(_)) => {
                "❌ Could not download your file. Please send it again."
            }
            JobError::Source(SourceError::Provider(_) | SourceError::Timeout(_)) => {
                "❌ Could not read your message. Please try again later."
            }
            JobError::Synthesis { .. } => {
                "❌ Speech synthesis failed. Please try again later."
            }
            JobError::Assembly(_) => "❌ Could not put the audio together. Please try again.",
            JobError::Delivery(_) => "❌ Could not send the audio. Please try again.",
            JobError::Panicked => "❌ Something went wrong while processing your request.",
        }
    }
}
