//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.

use crate::repositories::StoreError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use signgate_shared::{ErrorCode, ErrorDetail, ErrorResponse, FieldErrors, UserField};
use thiserror::Error;
use tracing::error;

/// Message for every failed sign-in, whatever the cause
pub const INVALID_CREDENTIALS: &str = "Invalid login or password";

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error on {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Conflict on {0:?}")]
    Conflict(Vec<UserField>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// The generic sign-in failure
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
    }

    /// Machine-readable kind
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation(_) => ErrorCode::ValidationError,
            ApiError::Conflict(_) => ErrorCode::Conflict,
            ApiError::Unauthorized(_) => ErrorCode::Unauthorized,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::BadRequest(_) => ErrorCode::BadRequest,
            ApiError::Internal(_) => ErrorCode::InternalError,
            ApiError::Database(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn conflict_message(fields: &[UserField]) -> String {
    let names = fields
        .iter()
        .map(UserField::as_str)
        .collect::<Vec<_>>()
        .join(" and ");
    format!("A user with this {} already exists", names)
}

fn conflict_field_errors(fields: &[UserField]) -> FieldErrors {
    fields
        .iter()
        .map(|f| (f.as_str().to_string(), vec![f.taken_message().to_string()]))
        .collect()
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(fields) => ApiError::Conflict(fields),
            StoreError::Database(e) => ApiError::Database(e),
            StoreError::Other(e) => ApiError::Internal(e),
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
        let status = self.status();
        let code = self.code();
        let (message, field_errors) = match self {
            ApiError::Validation(fields) => ("Invalid input".to_string(), Some(fields)),
            ApiError::Conflict(fields) => {
                (conflict_message(&fields), Some(conflict_field_errors(&fields)))
            }
            ApiError::Unauthorized(msg) | ApiError::NotFound(msg) | ApiError::BadRequest(msg) => {
                (msg, None)
            }
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                ("A database error occurred".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code,
                message,
                field_errors,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
