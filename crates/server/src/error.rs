//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Every error response has the shape
//! `{"error": <kind>, "message": <text>}`, plus `"field"` for validation
//! errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use store_ratings_core::ValidationError;

use crate::db::RepositoryError;
use crate::services::{AuthError, RatingError, TokenError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A request field failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Body could not be parsed, or a field has the wrong type.
    #[error("{0}")]
    BadRequest(String),

    /// Email already registered.
    #[error("Email already in use")]
    DuplicateEmail,

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Wrong email or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No usable bearer token.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but the role may not perform this operation.
    #[error("You do not have permission to perform this action")]
    Forbidden,

    /// Too many credential attempts from one client; carries seconds to wait.
    #[error("Too many requests, try again in {0}s")]
    RateLimited(u64),

    /// Storage operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl AppError {
    /// Machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => "validation_error",
            Self::DuplicateEmail => "duplicate_email",
            Self::NotFound(_) => "not_found",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::RateLimited(_) => "rate_limited",
            Self::Database(_) => "store_unavailable",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            _ => self.to_string(),
        };

        let field = match &self {
            Self::Validation(err) => Some(err.field()),
            _ => None,
        };

        let body = ErrorBody {
            error: self.kind(),
            message: &message,
            field,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(e) => Self::Validation(e),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::PrincipalNotFound => Self::NotFound("User not found".to_owned()),
            AuthError::DuplicateEmail => Self::DuplicateEmail,
            AuthError::Repository(e) => Self::Database(e),
            AuthError::PasswordHash => Self::Internal(err.to_string()),
        }
    }
}

impl From<RatingError> for AppError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::Validation(e) => Self::Validation(e),
            RatingError::UserNotFound => Self::NotFound("User not found".to_owned()),
            RatingError::StoreNotFound => Self::NotFound("Store not found".to_owned()),
            RatingError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed | TokenError::InvalidSignature => {
                Self::Unauthenticated("Invalid token".to_owned())
            }
            TokenError::Expired => Self::Unauthenticated("Token expired".to_owned()),
            TokenError::Key(_) | TokenError::Encode(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a principal ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, role: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
        scope.set_tag("principal.role", role);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use store_ratings_core::PasswordError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::Validation(ValidationError::Name)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::DuplicateEmail), StatusCode::CONFLICT);
        assert_eq!(
            get_status(AppError::NotFound("test".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Unauthenticated("test".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::RateLimited(5)),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_has_field() {
        let err = AppError::from(ValidationError::Password(PasswordError::Length));
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["field"], "password");
        assert_eq!(
            json["message"],
            "Password must be 8-16 characters with at least one uppercase letter and one special character"
        );
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "invalid email in database: row 17".to_owned(),
        ));
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "store_unavailable");
        assert_eq!(json["message"], "Internal server error");
        assert!(json.get("field").is_none());
    }

    #[test]
    fn test_service_error_mapping() {
        assert_eq!(
            AppError::from(AuthError::DuplicateEmail).kind(),
            "duplicate_email"
        );
        assert_eq!(
            AppError::from(RatingError::StoreNotFound).kind(),
            "not_found"
        );
        assert_eq!(
            AppError::from(TokenError::Expired).kind(),
            "unauthenticated"
        );
        assert_eq!(
            AppError::from(TokenError::InvalidSignature).to_string(),
            "Invalid token"
        );
    }
}
