use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::db::{check_connection, DbPool};
use crate::infrastructure::queue::JobQueue;
use crate::infrastructure::store::CounterStore;

/// Dependencies probed by the readiness check
pub struct HealthController {
    store: Arc<dyn CounterStore>,
    queue: Arc<JobQueue>,
    /// `None` when the process runs without the preferences database
    pool: Option<Arc<DbPool>>,
}

impl HealthController {
    pub fn new(store: Arc<dyn CounterStore>, queue: Arc<JobQueue>, pool: Option<Arc<DbPool>>) -> Self {
        Self { store, queue, pool }
    }

    /// GET /health - Liveness
    pub async fn health() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// GET /health/ready - Shared store and database connectivity
    pub async fn health_ready(State(controller): State<Arc<HealthController>>) -> impl IntoResponse {
        let queue_ok = match controller.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Shared store ping failed");
                false
            }
        };

        let database = match &controller.pool {
            Some(pool) => match check_connection(pool).await {
                Ok(_) => "connected",
                Err(e) => {
                    tracing::warn!(error = %e, "Database check failed");
                    "disconnected"
                }
            },
            None => "not_configured",
        };

        let pending_jobs = if queue_ok {
            controller.queue.pending().await.ok()
        } else {
            None
        };

        let ready = queue_ok && database != "disconnected";
        let status = if ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (
            status,
            Json(json!({
                "status": if ready { "ready" } else { "not_ready" },
                "queueConnectivity": if queue_ok { "connected" } else { "disconnected" },
                "database": database,
                "pendingJobs": pending_jobs,
            })),
        )
    }
}
