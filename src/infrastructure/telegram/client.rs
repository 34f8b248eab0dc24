use crate::domain::status::ReporterError;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Longest text Telegram accepts in a message
pub const MAX_MESSAGE_CHARS: usize = 4096;
/// Longest caption Telegram accepts on a media message
pub const MAX_CAPTION_CHARS: usize = 1024;

/// Envelope wrapping every Bot API answer
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

#[derive(Debug, Deserialize)]
struct RemoteFile {
    file_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct EditMessageBody<'a> {
    chat_id: &'a str,
    message_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteMessageBody<'a> {
    chat_id: &'a str,
    message_id: i64,
}

#[derive(Debug, Serialize)]
struct GetFileBody<'a> {
    file_id: &'a str,
}

/// Media kinds the client can upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Ogg/Opus shown as a voice note
    Voice,
    /// Anything else playable, shown in the music player
    Audio,
}

impl MediaKind {
    fn method(&self) -> &'static str {
        match self {
            MediaKind::Voice => "sendVoice",
            MediaKind::Audio => "sendAudio",
        }
    }

    fn field(&self) -> &'static str {
        match self {
            MediaKind::Voice => "voice",
            MediaKind::Audio => "audio",
        }
    }
}

/// Thin Bot API client
pub struct TelegramClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl TelegramClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self::with_base_url(http, token, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(http: reqwest::Client, token: String, base_url: String) -> Self {
        Self {
            http,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<SentMessage, ReporterError> {
        let body = SendMessageBody {
            chat_id,
            text: truncate_chars(text, MAX_MESSAGE_CHARS),
        };
        self.call("sendMessage", &body).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
    ) -> Result<(), ReporterError> {
        let body = EditMessageBody {
            chat_id,
            message_id,
            text: truncate_chars(text, MAX_MESSAGE_CHARS),
        };
        // The result is either the edited message or `true`; neither is needed
        self.call::<serde_json::Value, _>("editMessageText", &body)
            .await
            .map(|_| ())
    }

    pub async fn delete_message(&self, chat_id: &str, message_id: i64) -> Result<(), ReporterError> {
        let body = DeleteMessageBody {
            chat_id,
            message_id,
        };
        self.call::<bool, _>("deleteMessage", &body).await.map(|_| ())
    }

    pub async fn send_media(
        &self,
        kind: MediaKind,
        chat_id: &str,
        bytes: Vec<u8>,
        file_name: String,
        mime_type: &str,
        caption: Option<&str>,
    ) -> Result<SentMessage, ReporterError> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_type)
            .map_err(|e| ReporterError::Rejected(format!("invalid mime type: {}", e)))?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(kind.field(), part);
        if let Some(caption) = caption {
            form = form.text("caption", truncate_chars(caption, MAX_CAPTION_CHARS).to_string());
        }

        tracing::debug!(
            method = kind.method(),
            chat_id = %chat_id,
            size_bytes = size,
            "Uploading audio to Telegram"
        );

        let response = self
            .http
            .post(self.method_url(kind.method()))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        read_response(kind.method(), response).await
    }

    /// Resolve a file id to its download path
    pub async fn get_file_path(&self, file_id: &str) -> Result<String, ReporterError> {
        let file: RemoteFile = self.call("getFile", &GetFileBody { file_id }).await?;
        file.file_path
            .ok_or_else(|| ReporterError::Rejected(format!("file {} has no download path", file_id)))
    }

    pub async fn download(&self, file_path: &str) -> Result<Vec<u8>, ReporterError> {
        let response = self
            .http
            .get(self.file_url(file_path))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("file download failed with HTTP {}", status.as_u16());
            return Err(if status.is_server_error() {
                ReporterError::Transport(message)
            } else {
                ReporterError::Rejected(message)
            });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    async fn call<T, B>(&self, method: &str, body: &B) -> Result<T, ReporterError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        read_response(method, response).await
    }
}

async fn read_response<T: DeserializeOwned>(
    method: &str,
    response: reqwest::Response,
) -> Result<T, ReporterError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
        let message = format!("{} answered HTTP {} with an unreadable body: {}", method, status.as_u16(), e);
        if status.is_server_error() {
            ReporterError::Transport(message)
        } else {
            ReporterError::Rejected(message)
        }
    })?;

    into_result(method, parsed)
}

fn into_result<T>(method: &str, response: ApiResponse<T>) -> Result<T, ReporterError> {
    if response.ok {
        if let Some(result) = response.result {
            return Ok(result);
        }
        return Err(ReporterError::Rejected(format!("{} returned no result", method)));
    }

    let description = response
        .description
        .unwrap_or_else(|| "no description".to_string());
    let message = format!("{}: {}", method, description);
    match response.error_code {
        Some(code) if code == 429 || code >= 500 => Err(ReporterError::Transport(message)),
        _ => Err(ReporterError::Rejected(message)),
    }
}

fn transport_error(error: reqwest::Error) -> ReporterError {
    ReporterError::Transport(error.to_string())
}

pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}
