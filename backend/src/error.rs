//! Error handling for the Mercado Express backend
//!
//! Every error maps 1:1 to an HTTP status and is rendered in the uniform
//! `{success, data?, message?, error?}` envelope. Internal details never
//! reach the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use thiserror::Error;

use shared::ApiResponse;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token issued for a different principal kind")]
    WrongTokenKind,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation / business-rule errors
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Minimum order is S/ {minimum}")]
    MinimumOrderNotMet { minimum: Decimal },

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid or expired verification code")]
    InvalidCode,

    #[error("Phone is already verified")]
    AlreadyVerified,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("A code was already sent. Wait for it to expire before requesting another")]
    RateLimited,

    // External service errors
    #[error("Messaging service unavailable: {0}")]
    ServiceUnavailable(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable error code for the response envelope
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::WrongTokenKind => "WRONG_TOKEN_KIND",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::MinimumOrderNotMet { .. } => "MINIMUM_ORDER_NOT_MET",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::InvalidCode => "INVALID_CODE",
            AppError::AlreadyVerified => "ALREADY_VERIFIED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::RateLimited => "RATE_LIMITED",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::Unexpected(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::InvalidToken
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::WrongTokenKind | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation { .. }
            | AppError::InvalidRequest(_)
            | AppError::MinimumOrderNotMet { .. }
            | AppError::InvalidTransition { .. }
            | AppError::InvalidCode
            | AppError::AlreadyVerified => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Internal(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing message. Never echoes database or upstream internals.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Internal(_) | AppError::Unexpected(_) => {
                "An internal server error occurred".to_string()
            }
            AppError::ServiceUnavailable(_) => {
                "Could not deliver the verification message. Try again later".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Map a sqlx error on insert/update to a conflict when a unique
    /// constraint fired. Unique constraints are the authoritative guard
    /// against duplicate registration races.
    pub fn from_unique_violation(err: sqlx::Error, what: &str) -> AppError {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(format!("{what} is already registered"));
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }

        let body = ApiResponse::error(self.code(), self.public_message());
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_guards_map_to_bad_request() {
        // Deleting a referenced business or product is a rejected request,
        // not a uniqueness conflict
        let err = AppError::InvalidRequest("Business has 3 associated orders".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflict_is_reserved_for_uniqueness() {
        let err = AppError::Conflict("Phone is already registered".to_string());
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert!(!err.public_message().contains("pool"));
    }
}
