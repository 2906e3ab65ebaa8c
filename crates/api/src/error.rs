//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Client errors are JSON: either `{"detail": "..."}` or, for field
//! validation, `{"field": ["message", ...]}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::validation::FieldErrors;

/// Detail returned for a rejected login.
pub const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

/// Detail returned when a caller lacks permission.
pub const FORBIDDEN: &str = "You do not have permission to perform this action.";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request fields failed validation.
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(RepositoryError::NotFound) => false,
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(
                err,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_)
            ),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Internal server error" })),
            )
                .into_response();
        }

        let detail = |status: StatusCode, message: &str| {
            (status, Json(json!({ "detail": message }))).into_response()
        };
        let fields = |errors: FieldErrors| (StatusCode::BAD_REQUEST, Json(errors)).into_response();

        match self {
            Self::Validation(errors) => fields(errors),
            Self::BadRequest(msg) => detail(StatusCode::BAD_REQUEST, &msg),
            Self::Unauthorized(msg) => detail(StatusCode::UNAUTHORIZED, &msg),
            Self::Forbidden => detail(StatusCode::FORBIDDEN, FORBIDDEN),
            Self::NotFound(msg) => detail(StatusCode::NOT_FOUND, &msg),
            Self::Database(_) => detail(StatusCode::NOT_FOUND, "Not found."),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    detail(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
                }
                AuthError::InvalidToken => detail(
                    StatusCode::UNAUTHORIZED,
                    "Given token not valid for any token type",
                ),
                AuthError::UserNotFound => {
                    detail(StatusCode::UNAUTHORIZED, "User not found or inactive")
                }
                AuthError::InvalidEmail(_) => {
                    fields(FieldErrors::single("email", "Enter a valid email address."))
                }
                AuthError::EmailTaken => fields(FieldErrors::single(
                    "email",
                    "user with this email already exists.",
                )),
                AuthError::UsernameTaken => fields(FieldErrors::single(
                    "username",
                    "A user with that username already exists.",
                )),
                AuthError::WeakPassword(msg) => fields(FieldErrors::single("password", msg)),
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_) => {
                    detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            Self::Internal(_) => {
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidToken)),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_detail_body() {
        let response = AppError::NotFound("No cart found for this user".to_string()).into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "detail": "No cart found for this user" })
        );
    }

    #[tokio::test]
    async fn test_validation_body_is_field_map() {
        let response = AppError::Validation(FieldErrors::single("name", "This field is required."))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "name": ["This field is required."] })
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Internal("pool exhausted at 10.0.0.5".to_string()).into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "detail": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn test_login_failure_detail() {
        let response = AppError::Auth(AuthError::InvalidCredentials).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": INVALID_CREDENTIALS })
        );
    }

    #[tokio::test]
    async fn test_taken_username_is_field_error() {
        let response = AppError::Auth(AuthError::UsernameTaken).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body.get("username").is_some());
    }
}
