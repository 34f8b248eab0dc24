use crate::domain::sources::FileRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for POST /api/jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobRequest {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileRef>,
}

/// Response for POST /api/jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
    /// Whether the daily budget notice went out with this request
    pub notice_sent: bool,
}
