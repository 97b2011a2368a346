// Error handling types for the API

use axum::{
    http::{header::WWW_AUTHENTICATE, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::error;

use super::validation::ValidationResult;

/// Failures of the authentication and session lifecycle
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    BadCredentials,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Your account is disabled. Please contact support.")]
    AccountDisabled,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Invalid token type")]
    WrongTokenType,

    #[error("Malformed token")]
    MalformedToken,

    #[error("OAuth state is invalid or expired")]
    OAuthStateInvalid,

    #[error("OAuth exchange failed: {0}")]
    OAuthExchangeFailed(String),

    #[error("Identity verification failed: {0}")]
    IdentityVerificationFailed(String),

    #[error("User with this email already registered")]
    EmailAlreadyRegistered,

    #[error("Directory error: {0}")]
    Directory(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    InternalServer(String),
    DatabaseError(sqlx::Error),
    ValidationError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT"),
            ApiError::InternalServer(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "INTERNAL_SERVER_ERROR",
            ),
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                    "DATABASE_ERROR",
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(WWW_AUTHENTICATE, "Bearer")], Json(error_response)).into_response();
        }

        (status, Json(error_response)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // Unknown accounts are reported like any other credential failure
            AuthError::AccountNotFound => ApiError::Unauthorized("Could not validate credentials".into()),
            AuthError::AccountDisabled => ApiError::Forbidden(err.to_string()),
            AuthError::EmailAlreadyRegistered => ApiError::Conflict(err.to_string()),
            AuthError::Directory(e) => ApiError::DatabaseError(e),
            AuthError::Internal(msg) => {
                error!(error = %msg, "Internal authentication error");
                ApiError::InternalServer("Authentication service error".into())
            }
            AuthError::BadCredentials
            | AuthError::ExpiredToken
            | AuthError::BadSignature
            | AuthError::WrongTokenType
            | AuthError::MalformedToken
            | AuthError::OAuthStateInvalid
            | AuthError::OAuthExchangeFailed(_)
            | AuthError::IdentityVerificationFailed(_) => ApiError::Unauthorized(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            let error_messages: Vec<String> = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            ApiError::ValidationError(error_messages.join(", "))
        }
    }
}
