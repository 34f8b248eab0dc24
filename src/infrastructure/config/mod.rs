use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::rate_limit::RateLimits;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Synthesis
    pub tts_provider: TtsProvider,
    pub openai_api_key: String,
    pub openai_tts_model: String,
    pub openai_enhance_model: String,
    pub openai_transcribe_model: String,
    pub aws_region: String,
    pub synthesis_max_attempts: u32,
    pub synthesis_timeout_secs: u64,
    // Transport
    pub telegram_bot_token: String,
    pub http_timeout_secs: u64,
    pub http_connect_timeout_secs: u64,
    // Pipeline
    pub worker_concurrency: usize,
    pub chunk_max_chars: usize,
    pub max_text_chars: usize,
    pub ffmpeg_path: String,
    pub ffmpeg_timeout_secs: u64,
    pub source_timeout_secs: u64,
    pub queue_name: String,
    pub queue_poll_timeout_secs: u64,
    // Admission
    pub minute_request_limit: i64,
    pub daily_character_limit: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// JSON for log shipping in production, readable output elsewhere
    fn default_for(environment: &Environment) -> Self {
        match environment {
            Environment::Production => LogFormat::Json,
            Environment::Development => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    OpenAi,
    Polly,
}

impl FromStr for TtsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(TtsProvider::OpenAi),
            "polly" => Ok(TtsProvider::Polly),
            other => Err(format!("unknown TTS_PROVIDER '{}', expected openai or polly", other)),
        }
    }
}

/// Read `name`, falling back to `default`, and parse it
fn parsed<T>(name: &str, default: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| format!("invalid {} '{}': {}", name, raw, e).into())
}

fn required(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    env::var(name).map_err(|_| format!("{} must be set", name).into())
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let environment = match env::var("ENVIRONMENT").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };
        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::default_for(&environment),
        };

        let config = Config {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", "5")?,
            redis_url: required("REDIS_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("PORT", "8080")?,
            jwt_secret: required("JWT_SECRET")?,
            environment,
            log_format,
            tts_provider: parsed("TTS_PROVIDER", "openai")?,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_tts_model: env::var("OPENAI_TTS_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini-tts".to_string()),
            openai_enhance_model: env::var("OPENAI_ENHANCE_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_transcribe_model: env::var("OPENAI_TRANSCRIBE_MODEL")
                .unwrap_or_else(|_| "whisper-1".to_string()),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            synthesis_max_attempts: parsed("SYNTHESIS_MAX_ATTEMPTS", "3")?,
            synthesis_timeout_secs: parsed("SYNTHESIS_TIMEOUT_SECS", "60")?,
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            http_timeout_secs: parsed("HTTP_TIMEOUT_SECS", "60")?,
            http_connect_timeout_secs: parsed("HTTP_CONNECT_TIMEOUT_SECS", "10")?,
            worker_concurrency: parsed("WORKER_CONCURRENCY", "3")?,
            chunk_max_chars: parsed("CHUNK_MAX_CHARS", "4000")?,
            max_text_chars: parsed("MAX_TEXT_CHARS", "100000")?,
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffmpeg_timeout_secs: parsed("FFMPEG_TIMEOUT_SECS", "120")?,
            source_timeout_secs: parsed("SOURCE_TIMEOUT_SECS", "120")?,
            queue_name: env::var("QUEUE_NAME").unwrap_or_else(|_| "tts:jobs".to_string()),
            queue_poll_timeout_secs: parsed("QUEUE_POLL_TIMEOUT_SECS", "5")?,
            minute_request_limit: parsed("MINUTE_REQUEST_LIMIT", "10")?,
            daily_character_limit: parsed("DAILY_CHARACTER_LIMIT", "20000")?,
        };

        Ok(config)
    }

    pub fn rate_limits(&self) -> RateLimits {
        RateLimits {
            requests_per_minute: self.minute_request_limit,
            characters_per_day: self.daily_character_limit,
        }
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }

    pub fn ffmpeg_timeout(&self) -> Duration {
        Duration::from_secs(self.ffmpeg_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn http_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http_connect_timeout_secs)
    }

    /// Bound on text enhancement, document extraction and transcription
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn queue_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_poll_timeout_secs)
    }
}
