use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;

use crate::{
    domain::{
        admission::{AdmissionService, SubmitJobRequest, SubmitJobResponse},
        shared::usage_dto::UsageResponse,
    },
    error::AppResult,
    infrastructure::auth::AuthOwner,
};

pub struct JobsController {
    admission: Arc<AdmissionService>,
}

impl JobsController {
    pub fn new(admission: Arc<AdmissionService>) -> Self {
        Self { admission }
    }

    /// POST /api/jobs - Accept a job for background synthesis
    pub async fn submit(
        State(controller): State<Arc<JobsController>>,
        Extension(auth_owner): Extension<AuthOwner>,
        Json(request): Json<SubmitJobRequest>,
    ) -> AppResult<(StatusCode, Json<SubmitJobResponse>)> {
        let response = controller
            .admission
            .submit(&auth_owner.owner_id, request)
            .await?;

        Ok((StatusCode::ACCEPTED, Json(response)))
    }

    /// GET /api/usage - Current counters and limits
    pub async fn get_usage(
        State(controller): State<Arc<JobsController>>,
        Extension(auth_owner): Extension<AuthOwner>,
    ) -> AppResult<Json<UsageResponse>> {
        let usage = controller.admission.usage(&auth_owner.owner_id).await?;
        Ok(Json(usage))
    }
}
