//! Typed API errors and their HTTP mapping.
//!
//! The taxonomy: validation errors are 400 and carry the offending
//! message (plus crisis resources when the safety screen tripped);
//! authorization failures are 401/403; missing or unowned rows are 404;
//! state conflicts (claiming a non-completed instance) are 409; gateway
//! rate-limit and credit failures pass through as 429/402; everything
//! unexpected is logged and surfaced as a generic 500. Nothing is
//! retried automatically.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::mentor::GatewayError;
use crate::validation::{CrisisResource, TextRejection, CRISIS_RESOURCES};

/// API error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid input, blocked before any write.
    #[error("{0}")]
    Validation(String),
    /// Input rejected by the safety screen.
    #[error("{}", .0.message)]
    UnsafeContent(TextRejection),
    /// Missing or invalid bearer token.
    #[error("Unauthorized")]
    Unauthorized,
    /// Authenticated but not allowed (role or plan limit).
    #[error("{0}")]
    Forbidden(String),
    /// Row absent or not owned by the caller.
    #[error("{0}")]
    NotFound(String),
    /// State-machine conflict; the request is rejected, not retried.
    #[error("{0}")]
    Conflict(String),
    /// AI gateway failure, mapped to a fixed status.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// Unexpected failure; logged, generic message returned.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<TextRejection> for ApiError {
    fn from(rejection: TextRejection) -> Self {
        Self::UnsafeContent(rejection)
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<&'static [CrisisResource]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message,
                    resources: None,
                },
            ),
            Self::UnsafeContent(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: rejection.message.clone(),
                    resources: rejection.resources.then_some(CRISIS_RESOURCES),
                },
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "Unauthorized".to_string(),
                    resources: None,
                },
            ),
            Self::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: message,
                    resources: None,
                },
            ),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: message,
                    resources: None,
                },
            ),
            Self::Conflict(message) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: message,
                    resources: None,
                },
            ),
            Self::Gateway(error) => {
                let status = match &error {
                    GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                    GatewayError::CreditsExhausted => StatusCode::PAYMENT_REQUIRED,
                    GatewayError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
                    GatewayError::Upstream { .. }
                    | GatewayError::InvalidResponse(_)
                    | GatewayError::Transport(_) => StatusCode::BAD_GATEWAY,
                };
                tracing::error!(error = %error, "AI gateway failure");
                (
                    status,
                    ErrorBody {
                        error: error.to_string(),
                        resources: None,
                    },
                )
            }
            Self::Internal(error) => {
                tracing::error!(error = ?error, "Unhandled internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Internal server error".to_string(),
                        resources: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
