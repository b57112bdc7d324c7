use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown identity or rejected credential. Both render identically.
    #[error("user not found or invalid")]
    AuthenticationFailed,

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("invalid token")]
    InvalidToken,

    #[error("user not found")]
    UserNotFound,

    #[error("inactive user")]
    InactiveUser,

    #[error("user already registered")]
    AlreadyRegistered,

    /// Registration credential did not prove the claimed external id.
    #[error("user invalid")]
    RegistrationRejected,

    #[error("pseudonym already taken")]
    PseudonymTaken,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateExternalId => AppError::AlreadyRegistered,
            StoreError::DuplicatePseudonym => AppError::PseudonymTaken,
            StoreError::Other(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::AuthenticationFailed => {
                (StatusCode::UNAUTHORIZED, "User not found or invalid".to_string())
            }
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            AppError::UserNotFound => (StatusCode::UNAUTHORIZED, "User not found".to_string()),
            AppError::InactiveUser => (StatusCode::FORBIDDEN, "Inactive user".to_string()),
            AppError::AlreadyRegistered => {
                (StatusCode::BAD_REQUEST, "User already registered".to_string())
            }
            AppError::RegistrationRejected => (StatusCode::BAD_REQUEST, "User invalid".to_string()),
            AppError::PseudonymTaken => {
                (StatusCode::BAD_REQUEST, "Pseudonym already taken".to_string())
            }
            AppError::InvalidRequest(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let mut response = (status, Json(json!({ "detail": detail }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}
