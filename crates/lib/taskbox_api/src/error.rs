//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uniqueness violation on registration or profile update. Reported as
    /// 400 (the route contract) but kept distinct from plain validation so
    /// the body carries a `conflict` error code.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Conflict(m) => (StatusCode::BAD_REQUEST, "conflict", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            // Storage and unexpected failures never leak detail to the client.
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error.",
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Username or email already exists.".into())
            }
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<taskbox_core::auth::AuthError> for AppError {
    fn from(e: taskbox_core::auth::AuthError) -> Self {
        match e {
            taskbox_core::auth::AuthError::CredentialError => {
                AppError::Unauthorized("Invalid credentials.".into())
            }
            taskbox_core::auth::AuthError::TokenError(msg) => AppError::Unauthorized(msg),
            taskbox_core::auth::AuthError::ValidationError(msg) => AppError::Validation(msg),
            taskbox_core::auth::AuthError::DbError(e) => AppError::from(e),
            taskbox_core::auth::AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (AppError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (AppError::Conflict("c".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("n".into()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized("u".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("f".into()), StatusCode::FORBIDDEN),
            (
                AppError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn internal_error_hides_detail() {
        let response = AppError::Internal("connection refused on 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The message is in the body, which we can't easily inspect here
        // without a runtime; the Display impl is what must stay generic.
        assert_eq!(
            AppError::Internal("connection refused".into()).to_string(),
            "Internal server error"
        );
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
