//! API request and response types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ErrorCode;
use crate::models::PublicUser;
use crate::validation::{validate_login, validate_password, validate_username};

/// Field name to messages, in the shape the form layer renders
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

/// `user.signIn` input
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    /// Username or email
    #[serde(default)]
    #[validate(custom(function = "validate_login"))]
    pub login: String,
    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

/// `user.signUp` input
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[serde(default)]
    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email is too long")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub password_confirmation: String,
}

/// `user.checkUnique` input
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckUniqueQuery {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl CheckUniqueQuery {
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|s| !s.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|s| !s.is_empty())
    }
}

/// `user.checkUnique` result: `true` means the value is already taken.
///
/// Only the first taken field is reported; when nothing is taken both flags
/// are present and `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckUniqueResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
}

impl CheckUniqueResponse {
    pub fn username_taken() -> Self {
        Self {
            username: Some(true),
            email: None,
        }
    }

    pub fn email_taken() -> Self {
        Self {
            username: None,
            email: Some(true),
        }
    }

    pub fn available() -> Self {
        Self {
            username: Some(false),
            email: Some(false),
        }
    }
}

/// Successful sign-in or sign-up: the public user fields plus a fresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}
