use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// File uploaded through the transport, resolved to text before synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("could not download file: {0}")]
    Download(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("gave up after {0:?}")]
    Timeout(std::time::Duration),
}

/// Fetches the raw bytes of a transport file
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, file: &FileRef) -> Result<Vec<u8>, SourceError>;
}

/// Reduces a document of any supported format to plain text
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, file: &FileRef) -> Result<String, SourceError>;
}

/// Turns a voice message into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, file: &FileRef) -> Result<String, SourceError>;
}

/// AI pass that fixes punctuation and casing so the text reads well aloud
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    async fn enhance(&self, text: &str) -> Result<String, SourceError>;
}
