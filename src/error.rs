/// Unified error types for the Adsight account service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the account service
#[derive(Error, Debug)]
pub enum AuthError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Signup with an email that is already registered
    #[error("Email already registered")]
    EmailTaken,

    /// Login failure. Deliberately covers both an unknown email and a wrong
    /// password so the response does not reveal which factor failed.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Bearer token rejection. One variant for every failure mode (missing,
    /// malformed, tampered, expired, unknown subject) so callers cannot tell
    /// them apart.
    #[error("Could not validate credentials")]
    Unauthenticated,

    /// Valid principal, insufficient role
    #[error("Operation forbidden: not enough privileges (admin required)")]
    Forbidden,

    /// Password reset confirmation with a token that is unknown or past expiry
    #[error("Invalid or expired password reset token")]
    InvalidOrExpiredToken,

    /// Re-verification of the current password failed during a password
    /// change or account deletion
    #[error("Current password is incorrect")]
    CurrentPasswordMismatch,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AuthError::EmailTaken => (StatusCode::CONFLICT, "EmailTaken", self.to_string()),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "InvalidCredentials",
                self.to_string(),
            ),
            AuthError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden", self.to_string()),
            AuthError::InvalidOrExpiredToken => (
                StatusCode::BAD_REQUEST,
                "InvalidOrExpiredToken",
                self.to_string(),
            ),
            AuthError::CurrentPasswordMismatch => (
                StatusCode::FORBIDDEN,
                "CurrentPasswordMismatch",
                self.to_string(),
            ),
            AuthError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            AuthError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            AuthError::Database(_) | AuthError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for account service operations
pub type AuthResult<T> = Result<T, AuthError>;
