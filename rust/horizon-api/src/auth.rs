//! Bearer-token authentication middleware.
//!
//! Every protected route requires an `Authorization: Bearer <jwt>`
//! header signed with the configured HS256 secret. The middleware
//! validates the token and injects an [`AuthenticatedUser`] extension;
//! handlers never see unauthenticated requests. Admin-gated routes
//! additionally check the `user_roles` table, so a role claim in a
//! stale token is not authoritative.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Optional roles.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Authenticated user information extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User ID (from the JWT subject).
    pub user_id: String,
    /// Roles carried by the token (advisory; the store is authoritative).
    pub roles: Vec<String>,
}

/// Generate a signed bearer token.
pub fn issue_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiry_secs: u64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + expiry_secs as i64,
        iat: now,
        roles,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a bearer token and return its claims.
pub fn validate_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Axum middleware enforcing bearer authentication.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(secret) = state.config.auth.jwt_secret.as_deref() else {
        tracing::error!("JWT secret not configured; rejecting request");
        return Err(ApiError::Unauthorized);
    };

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

    let claims = validate_token(token, secret).map_err(|e| {
        tracing::debug!(error = %e, "Token validation failed");
        ApiError::Unauthorized
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
        roles: claims.roles,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips() {
        let token = issue_token("user-1", vec!["admin".to_string()], "secret", 3600).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.roles, vec!["admin"]);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("user-1", Vec::new(), "secret", 3600).unwrap();
        assert!(validate_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            exp: now - 600,
            iat: now - 1200,
            roles: Vec::new(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("secret".as_bytes()),
        )
        .unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }
}
