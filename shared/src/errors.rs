//! Error types for the Signgate application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::FieldErrors;

/// Machine-readable error codes carried in every error response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Conflict,
    Unauthorized,
    NotFound,
    BadRequest,
    InternalError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form handling errors on the client side
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Malformed form payload: {0}")]
    Malformed(String),

    #[error("Form has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),
}
