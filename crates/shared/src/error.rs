//! The error type shared by every Spendbee crate.

use thiserror::Error;

/// Shorthand for results carrying an [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Failure categories that map one-to-one onto HTTP statuses.
#[derive(Debug, Error)]
pub enum AppError {
    /// No valid session, or wrong credentials.
    #[error("Not signed in: {0}")]
    Unauthorized(String),

    /// Signed in but not allowed, e.g. not a group member.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown group, expense, member or notification.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request payload failed validation.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// State clash such as a taken email or a guest with records.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage failure.
    #[error("Database failure: {0}")]
    Database(String),

    /// Exchange rate table cannot serve a request.
    #[error("Exchange rate error: {0}")]
    ExchangeRate(String),

    /// Anything else that is the server's fault.
    #[error("Internal failure: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for the response.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::ExchangeRate(_) | Self::Internal(_) => 500,
        }
    }

    /// Machine-readable `error` field of the response body.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "database_error",
            Self::ExchangeRate(_) => "missing_exchange_rate",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the message safe to show to API clients.
    ///
    /// Server-side failures are collapsed into a generic message; the detail
    /// only goes to the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Validation(m)
            | Self::Conflict(m) => m.clone(),
            Self::ExchangeRate(m) => format!("Exchange rates unavailable: {m}"),
            Self::Database(_) | Self::Internal(_) => "An error occurred".to_string(),
        }
    }
}
