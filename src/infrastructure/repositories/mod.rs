pub mod openai_text_enhancer;
pub mod openai_transcriber;
pub mod openai_tts_repository;
pub mod polly_tts_repository;
pub mod preferences_repository;
pub mod retrying_tts_repository;
pub mod tts_repository;

pub use openai_text_enhancer::OpenAiTextEnhancer;
pub use openai_transcriber::OpenAiTranscriber;
pub use openai_tts_repository::OpenAiTtsRepository;
pub use polly_tts_repository::PollyTtsRepository;
pub use preferences_repository::{PgPreferencesRepository, PreferencesRepository};
pub use retrying_tts_repository::{RetryPolicy, RetryingTtsRepository};
pub use tts_repository::{effective_chunk_limit, TtsRepository, PROVIDER_SAFETY_MARGIN};
