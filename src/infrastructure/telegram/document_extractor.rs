use crate::domain::sources::{DocumentExtractor, FileFetcher, FileRef, SourceError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static MD_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").unwrap());
static MD_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+").unwrap());
static MD_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\*\*|__|\*|`{1,3}|~~)").unwrap());
static MD_LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+[.)])[ \t]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    PlainText,
    Markdown,
    Html,
}

/// Work out the format from the mime type, falling back to the extension
fn detect_format(file: &FileRef) -> Option<DocumentFormat> {
    let by_mime = file.mime_type.as_deref().and_then(|mime| {
        let essence = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Some(DocumentFormat::PlainText),
            "text/markdown" | "text/x-markdown" => Some(DocumentFormat::Markdown),
            "text/html" | "application/xhtml+xml" => Some(DocumentFormat::Html),
            _ => None,
        }
    });
    if by_mime.is_some() {
        return by_mime;
    }

    let extension = file
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())?;
    match extension.as_str() {
        "txt" | "text" => Some(DocumentFormat::PlainText),
        "md" | "markdown" => Some(DocumentFormat::Markdown),
        "html" | "htm" => Some(DocumentFormat::Html),
        _ => None,
    }
}

fn strip_markdown(text: &str) -> String {
    let text = MD_LINK.replace_all(text, "$1");
    let text = MD_HEADING.replace_all(&text, "");
    let text = MD_LIST_MARKER.replace_all(&text, "");
    MD_EMPHASIS.replace_all(&text, "").into_owned()
}

fn html_to_text(html: &[u8]) -> String {
    html2text::from_read(html, usize::MAX)
}

/// Text-like documents sent to the bot
pub struct TelegramDocumentExtractor {
    fetcher: Arc<dyn FileFetcher>,
}

impl TelegramDocumentExtractor {
    pub fn new(fetcher: Arc<dyn FileFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl DocumentExtractor for TelegramDocumentExtractor {
    async fn extract(&self, file: &FileRef) -> Result<String, SourceError> {
        let format = detect_format(file).ok_or_else(|| {
            SourceError::UnsupportedFormat(
                file.mime_type
                    .clone()
                    .or_else(|| file.file_name.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
            )
        })?;

        let bytes = self.fetcher.fetch(file).await?;

        let text = match format {
            DocumentFormat::Html => html_to_text(&bytes),
            DocumentFormat::PlainText | DocumentFormat::Markdown => {
                let decoded = String::from_utf8(bytes)
                    .map_err(|_| SourceError::UnsupportedFormat("document is not UTF-8 text".to_string()))?;
                if format == DocumentFormat::Markdown {
                    strip_markdown(&decoded)
                } else {
                    decoded
                }
            }
        };

        tracing::debug!(
            file_id = %file.file_id,
            format = ?format,
            text_length = text.chars().count(),
            "Extracted document text"
        );
        Ok(text)
    }
}
