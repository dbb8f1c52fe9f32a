//! HTTP-facing error type
//!
//! Every failure leaving a handler is an `ApiError`, rendered as
//! `{"error": "..."}` with the matching status code.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::storage::StorageError;
use crate::submission::SubmitError;

/// Machine-readable code attached to quota rejections
pub const TRIAL_LIMIT_CODE: &str = "TRIAL_LIMIT_REACHED";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    Judge(String),

    #[error("{0}")]
    Persist(String),

    #[error("storage did not answer in time")]
    StoreTimeout,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::QuotaExceeded(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Judge(_)
            | ApiError::Persist(_)
            | ApiError::StoreTimeout
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = match &self {
            ApiError::QuotaExceeded(msg) => json!({ "error": msg, "code": TRIAL_LIMIT_CODE }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadInput(rejection.body_text())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(msg) => ApiError::Conflict(msg),
            StorageError::Timeout(_) => ApiError::StoreTimeout,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        let msg = err.to_string();
        match err {
            SubmitError::BadInput(_) => ApiError::BadInput(msg),
            SubmitError::ProblemNotFound => ApiError::NotFound(msg),
            SubmitError::UserNotFound => ApiError::Unauthenticated(msg),
            SubmitError::QuotaExceeded { .. } => ApiError::QuotaExceeded(msg),
            SubmitError::JudgeFailed(_) => ApiError::Judge(msg),
            SubmitError::PersistFailed(_) => ApiError::Persist(msg),
            SubmitError::Storage(StorageError::Timeout(_)) => ApiError::StoreTimeout,
            SubmitError::Storage(_) => ApiError::Internal(msg),
        }
    }
}
