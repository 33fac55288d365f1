use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::repo::StoreError;

/// Failure taxonomy surfaced to clients. Every variant maps to a stable
/// machine-readable kind plus a human-readable message; nothing is retried
/// server-side.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidClaims(String),
    #[error("{0}")]
    Validation(String),
    #[error("malformed session token")]
    MalformedToken,
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("user not found")]
    UserNotFound,
    #[error("user account is deactivated")]
    AccountDisabled,
    #[error("session token mismatch")]
    SessionMismatch,
    #[error("session expired")]
    SessionExpired,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("email is already bound to a different identity")]
    IdentityConflict,
    #[error("duplicate key: {0}")]
    DuplicateKey(&'static str),
    #[error("store unavailable")]
    StoreUnavailable(#[source] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
}

impl ApiError {
    /// Stable kind string, part of the API contract.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidClaims(_) => "invalid_claims",
            ApiError::Validation(_) => "validation",
            ApiError::MalformedToken => "malformed_token",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::UserNotFound => "user_not_found",
            ApiError::AccountDisabled => "account_disabled",
            ApiError::SessionMismatch => "session_mismatch",
            ApiError::SessionExpired => "session_expired",
            ApiError::NotFound(_) => "not_found",
            ApiError::IdentityConflict => "identity_conflict",
            ApiError::DuplicateKey(_) => "duplicate_key",
            ApiError::StoreUnavailable(_) => "store_unavailable",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidClaims(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            // All identity-gate failures stay in the 401 family; a user the
            // gate cannot find is an authentication failure, not a missing
            // resource.
            ApiError::MalformedToken
            | ApiError::Unauthenticated(_)
            | ApiError::UserNotFound
            | ApiError::SessionMismatch
            | ApiError::SessionExpired => StatusCode::UNAUTHORIZED,
            ApiError::AccountDisabled => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::IdentityConflict | ApiError::DuplicateKey(_) => StatusCode::CONFLICT,
            ApiError::StoreUnavailable(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(key) => ApiError::DuplicateKey(key),
            StoreError::Unavailable(source) => ApiError::StoreUnavailable(source),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Don't leak store/internal details to clients.
            error!(error = %self, kind = self.kind(), "internal error");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            success: false,
            error: self.kind(),
            message,
        });

        (status, body).into_response()
    }
}
