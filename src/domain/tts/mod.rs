pub mod assembly;
pub mod chunker;
pub mod dto;
pub mod error;
pub mod language;
pub mod text;

pub use assembly::{order_segments, AssemblyError, AudioAssembler};
pub use chunker::{split, Chunk};
pub use dto::{AudioArtifact, AudioContainer, AudioSegment, SynthesisRequest, MAX_SPEED, MIN_SPEED};
pub use error::SynthesisError;
pub use language::{detect_language, LanguageCode};
pub use text::normalize_text;
