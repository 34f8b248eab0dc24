use crate::domain::rate_limit::LimitReason;
use crate::domain::status::ReporterError;
use crate::error::AppError;
use crate::infrastructure::queue::QueueError;
use crate::infrastructure::store::StoreError;

/// Why a job was not accepted
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("text cannot be empty")]
    EmptyText,
    #[error("text is {length} characters, the maximum is {max}")]
    TextTooLong { length: usize, max: usize },
    #[error("a {0} job needs a file")]
    MissingFile(String),
    #[error("unknown job kind '{0}'")]
    UnknownKind(String),
    #[error("{0}")]
    RateLimited(LimitReason),
    #[error("shared store error: {0}")]
    Store(#[from] StoreError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("preferences unavailable: {0}")]
    Preferences(#[from] sqlx::Error),
    #[error("could not reach the owner: {0}")]
    Reporter(#[from] ReporterError),
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::EmptyText
            | AdmissionError::MissingFile(_)
            | AdmissionError::UnknownKind(_) => AppError::BadRequest(err.to_string()),
            AdmissionError::TextTooLong { .. } => AppError::PayloadTooLarge(err.to_string()),
            AdmissionError::RateLimited(reason) => AppError::RateLimitExceeded {
                message: match reason {
                    LimitReason::MinuteLimit => "too many requests this minute".to_string(),
                    LimitReason::DayLimit => "daily character budget exhausted".to_string(),
                },
                reason: reason.to_string(),
            },
            AdmissionError::Store(e) => AppError::ServiceUnavailable(e.to_string()),
            AdmissionError::Queue(QueueError::Store(e)) => AppError::ServiceUnavailable(e.to_string()),
            AdmissionError::Queue(e) => AppError::Internal(e.to_string()),
            AdmissionError::Preferences(e) => AppError::Database(e),
            AdmissionError::Reporter(e) => AppError::ExternalService(e.to_string()),
        }
    }
}
