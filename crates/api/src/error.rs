//! Mapping of domain errors to HTTP responses.
//!
//! Every failure leaves the API as `{"error": <code>, "message": <text>}`
//! with the status given by [`AppError::status_code`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use spendbee_core::auth::PasswordError;
use spendbee_core::balance::BalanceError;
use spendbee_core::currency::CurrencyError;
use spendbee_core::expense::ExpenseError;
use spendbee_core::export::ExportError;
use spendbee_db::repositories::{ExpenseRepoError, NotificationError, RegistrationError};
use spendbee_shared::{AppError, JwtError};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An [`AppError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.public_message(),
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self(AppError::Database(e.to_string()))
    }
}

impl From<ExpenseError> for ApiError {
    fn from(e: ExpenseError) -> Self {
        Self(AppError::Validation(e.to_string()))
    }
}

impl From<CurrencyError> for ApiError {
    fn from(e: CurrencyError) -> Self {
        Self(AppError::ExchangeRate(e.to_string()))
    }
}

impl From<BalanceError> for ApiError {
    fn from(e: BalanceError) -> Self {
        match e {
            BalanceError::Currency(e) => e.into(),
            BalanceError::UnknownExpense(_) => Self(AppError::Internal(e.to_string())),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort => Self(AppError::Validation(e.to_string())),
            _ => Self(AppError::Internal(e.to_string())),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        Self(AppError::Internal(e.to_string()))
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        Self(AppError::Internal(e.to_string()))
    }
}

impl From<ExpenseRepoError> for ApiError {
    fn from(e: ExpenseRepoError) -> Self {
        match e {
            ExpenseRepoError::NotFound(_) => Self(AppError::NotFound("Expense not found".into())),
            ExpenseRepoError::Database(e) => e.into(),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::EmailTaken => Self(AppError::Conflict(e.to_string())),
            RegistrationError::InvalidInvitation => Self(AppError::Validation(e.to_string())),
            RegistrationError::Database(e) => e.into(),
        }
    }
}

impl From<NotificationError> for ApiError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::NotFound | NotificationError::GroupGone => {
                Self(AppError::NotFound(e.to_string()))
            }
            NotificationError::InvalidType => Self(AppError::Validation(e.to_string())),
            NotificationError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_rate_is_a_server_error() {
        let err: ApiError = BalanceError::Currency(CurrencyError::MissingRate("CHF".into())).into();
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "missing_exchange_rate");
        assert!(body["message"].as_str().unwrap().contains("CHF"));
    }

    #[tokio::test]
    async fn test_database_detail_is_hidden() {
        let (status, body) = body_of(DbErr::Custom("connection reset".into()).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "database_error");
        assert_eq!(body["message"], "An error occurred");
    }

    #[rstest]
    #[case(ExpenseError::EmptyDescription.into(), StatusCode::BAD_REQUEST)]
    #[case(ExpenseError::TooPrecise(rust_decimal::Decimal::new(4, 3)).into(), StatusCode::BAD_REQUEST)]
    #[case(PasswordError::TooShort.into(), StatusCode::BAD_REQUEST)]
    #[case(RegistrationError::EmailTaken.into(), StatusCode::CONFLICT)]
    #[case(NotificationError::NotFound.into(), StatusCode::NOT_FOUND)]
    #[case(ExpenseRepoError::NotFound(spendbee_shared::types::ExpenseId::new(1)).into(), StatusCode::NOT_FOUND)]
    #[tokio::test]
    async fn test_status_mapping(#[case] err: ApiError, #[case] expected: StatusCode) {
        let (status, _) = body_of(err).await;
        assert_eq!(status, expected);
    }
}
