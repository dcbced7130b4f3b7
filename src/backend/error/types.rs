/**
 * Backend Error Types
 *
 * `ApiError` is the single error type returned by the JSON handlers and the
 * page handlers. Client mistakes carry localized validation messages;
 * infrastructure failures keep their source for logging and are reported
 * to clients with a generic message.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::mail::MailError;
use crate::shared::ValidationErrors;

/// Handler error taxonomy
#[derive(Debug, Error)]
pub enum ApiError {
    /// Field or non-field validation messages, returned verbatim
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Missing, malformed or stale credentials
    #[error("authentication required")]
    Unauthorized,

    /// A required integration is not configured
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("mail delivery error: {0}")]
    Mail(#[from] MailError),
}

impl ApiError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Mail(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Password(_) | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to clients
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.to_string(),
            Self::Unauthorized => "Authentication credentials were not provided or are invalid".to_string(),
            Self::ServiceUnavailable(message) => message.clone(),
            Self::Mail(_) => "Failed to send confirmation email".to_string(),
            Self::Database(_) | Self::Password(_) | Self::Token(_) => "Server error".to_string(),
        }
    }
}
