//! HTTP error mapping
//!
//! Every failure leaves a handler as `{"success": false, "error": "..."}`
//! with a matching status code. Store and upstream details are logged here
//! and never returned to the caller.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};
use trinoro_common::api::{ApiAuthError, ErrorBody};

#[derive(Debug, Error)]
pub enum ApiError {
    /// No active session
    #[error("Unauthorized")]
    Unauthorized,

    /// Identity callback signature or timestamp rejected
    #[error("{0}")]
    InvalidSignature(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// External API failed; first field is the public message, second the detail
    #[error("{0}")]
    Upstream(String, String),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(..) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_not_found() -> Self {
        ApiError::NotFound("User not found".to_string())
    }
}

impl From<trinoro_common::Error> for ApiError {
    fn from(err: trinoro_common::Error) -> Self {
        use trinoro_common::Error;

        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ApiAuthError> for ApiError {
    fn from(err: ApiAuthError) -> Self {
        match err {
            ApiAuthError::InvalidHash { provided, calculated } => {
                warn!(
                    "Callback hash validation failed: provided={}, calculated={}",
                    provided, calculated
                );
                ApiError::InvalidSignature("Invalid signature".to_string())
            }
            ApiAuthError::DatabaseError(msg) => ApiError::Internal(msg),
            other => ApiError::InvalidSignature(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(detail) => error!("Request failed: {}", detail),
            ApiError::Upstream(message, detail) => warn!("{}: {}", message, detail),
            _ => {}
        }

        let status = self.status();
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
