use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::infrastructure::config::Config;
use crate::{
    controllers::{health::HealthController, jobs::JobsController},
    domain::auth::JwtManager,
    infrastructure::auth::{auth_middleware, request_id_middleware},
};

/// Build the application router with all routes configured
pub fn create_router(
    jwt_manager: Arc<JwtManager>,
    health_controller: Arc<HealthController>,
    jobs_controller: Arc<JobsController>,
) -> Router {
    // Job routes (need auth)
    let job_routes = Router::new()
        .route("/api/jobs", post(JobsController::submit))
        .route("/api/usage", get(JobsController::get_usage))
        .with_state(jobs_controller)
        .layer(middleware::from_fn_with_state(jwt_manager, auth_middleware));

    let health_routes = Router::new()
        .route("/health", get(HealthController::health))
        .route("/health/ready", get(HealthController::health_ready))
        .with_state(health_controller);

    Router::new()
        .merge(health_routes)
        .merge(job_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Serve `app` until `shutdown` resolves
pub async fn start_http_server<F>(
    config: &Config,
    app: Router,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
