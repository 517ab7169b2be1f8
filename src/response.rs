use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Success envelope returned by every handler: `{status, message, data}`.
/// `status` mirrors the HTTP status code; `data` serializes as `null` for
/// operations with nothing to return.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    code: StatusCode,
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(code: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            status: code.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message_only(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: code.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}

/// One field-level validation failure, serialized into the `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Please verify your account first")]
    AccountNotVerified,
    #[error("Verification data not found")]
    TokenNotFound,
    #[error("Email not found")]
    EmailNotFound,
    #[error("Authorization scheme must be Bearer")]
    BadTokenScheme,
    #[error("No token found")]
    MissingToken,
    #[error("Invalid or expired token")]
    Unauthorized,
    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateEmail | ApiError::InvalidCredentials => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::AccountNotVerified | ApiError::TokenNotFound | ApiError::BadTokenScheme => {
                StatusCode::BAD_REQUEST
            }
            ApiError::EmailNotFound | ApiError::MissingToken => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error envelope: `{status, message, errors}`. `errors` carries field-level
/// detail for validation failures and is `null` otherwise.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
    errors: Option<Vec<FieldError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status();
        // Clients get the display message; the underlying cause stays in the
        // logs only.
        let message = self.to_string();
        let errors = match self {
            ApiError::Validation(errors) => Some(errors),
            ApiError::Internal(err) => {
                error!(error = %err, "request failed");
                None
            }
            _ => None,
        };

        let body = ErrorBody {
            status: code.as_u16(),
            message,
            errors,
        };
        (code, Json(body)).into_response()
    }
}
