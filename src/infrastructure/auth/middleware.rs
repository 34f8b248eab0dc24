use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{domain::auth::JwtManager, domain::shared::OwnerId, error::AppError};

/// Owner context injected into request extensions after authentication
#[derive(Debug, Clone)]
pub struct AuthOwner {
    pub owner_id: OwnerId,
}

/// Authentication middleware
pub async fn auth_middleware(
    State(jwt_manager): State<Arc<JwtManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    // Check Bearer token format
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))?;

    let owner_id = jwt_manager.extract_owner_id(token)?;

    request.extensions_mut().insert(AuthOwner { owner_id });

    Ok(next.run(request).await)
}
