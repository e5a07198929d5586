//! API error taxonomy and its HTTP mapping.
//!
//! Every failure leaving the service becomes `{message}` plus a
//! conventional status. Internal faults are logged with their detail and
//! answered with a generic message.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::account::AccountError;
use crate::auth::AuthError;
use crate::ledger::LedgerError;

/// Wire shape of every error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    #[error("too many requests")]
    RateLimited { retry_after_secs: u64 },
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    /// The one generic 401 used wherever the cause must stay hidden.
    pub fn unauthenticated() -> Self {
        ApiError::Authentication("Authentication required".to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Authorization("Access denied".to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                "Something went wrong".to_string()
            }
            ApiError::RateLimited { .. } => {
                "Too many requests, please try again later".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (status, Json(ErrorBody { message })).into_response();

        if let ApiError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidOtp | AuthError::InvalidToken => {
                // One message for every credential failure; which factor
                // failed is not disclosed.
                ApiError::Authentication("Invalid credentials".to_string())
            }
            AuthError::OtpRequired => ApiError::Authentication(err.to_string()),
            AuthError::DeliveryFailed | AuthError::HashFailure => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount => {
                ApiError::Validation("Valid amount is required".to_string())
            }
            LedgerError::InsufficientFunds => {
                ApiError::Validation("Insufficient funds".to_string())
            }
            LedgerError::AccountNotFound => ApiError::NotFound("Account not found".to_string()),
            LedgerError::BalanceUpdateFailed => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound => ApiError::NotFound("Account not found".to_string()),
            // Non-disclosing: registration conflicts look like any other
            // rejected registration.
            AccountError::EmailTaken => {
                ApiError::Validation("Registration could not be completed".to_string())
            }
            AccountError::InsufficientFunds => {
                ApiError::Validation("Insufficient funds".to_string())
            }
        }
    }
}
