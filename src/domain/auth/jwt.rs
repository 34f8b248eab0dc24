use crate::domain::shared::OwnerId;
use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims of a token issued by the transport for one owner
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Owner ID
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

pub struct JwtManager {
    secret: String,
}

impl JwtManager {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Generate a token for an owner, valid for `ttl`
    pub fn generate_token(&self, owner: &OwnerId, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + ttl;

        let claims = Claims {
            sub: owner.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }

    /// Extract owner ID from token
    pub fn extract_owner_id(&self, token: &str) -> AppResult<OwnerId> {
        let claims = self.validate_token(token)?;
        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("Missing owner in token".to_string()));
        }
        Ok(OwnerId::new(claims.sub))
    }
}
