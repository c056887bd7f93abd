//! Input validation functions
//!
//! The sign-in and sign-up schemas are expressed with `validator` derives on
//! the request types; this module holds the field checks they call and the
//! helpers that turn `ValidationErrors` into per-field messages.

use std::borrow::Cow;

pub use validator::Validate;
use validator::{ValidationError, ValidationErrors};

use crate::types::FieldErrors;

pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 50;
pub const LOGIN_MIN_CHARS: usize = 2;
/// Width of the stored email column
pub const EMAIL_MAX_CHARS: usize = 255;
/// Any registered email must still be usable as a login
pub const LOGIN_MAX_CHARS: usize = EMAIL_MAX_CHARS;

fn length_error(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("length");
    err.message = Some(Cow::Borrowed(message));
    err
}

fn check_length(
    value: &str,
    min: usize,
    max: usize,
    too_short: &'static str,
    too_long: &'static str,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(length_error(too_short));
    }
    if len > max {
        return Err(length_error(too_long));
    }
    Ok(())
}

/// Validate username length (2-50 characters)
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    check_length(
        username,
        USERNAME_MIN_CHARS,
        USERNAME_MAX_CHARS,
        "Username is too short",
        "Username isn't supposed to be this long",
    )
}

/// Validate password length (8-50 characters)
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    check_length(
        password,
        PASSWORD_MIN_CHARS,
        PASSWORD_MAX_CHARS,
        "Password is too short",
        "Password is too long",
    )
}

/// Validate a sign-in login, which may be a username or an email
pub fn validate_login(login: &str) -> Result<(), ValidationError> {
    check_length(
        login,
        LOGIN_MIN_CHARS,
        LOGIN_MAX_CHARS,
        "Login is too short",
        "Login is too long",
    )
}

/// Canonical form of an email address as stored and compared
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Convert a snake_case field name to the camelCase name used on the wire
fn wire_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Flatten `ValidationErrors` into field name -> messages
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("Invalid value ({})", e.code),
            })
            .collect::<Vec<_>>();
        out.entry(wire_name(&field.to_string()))
            .or_default()
            .extend(messages);
    }
    out
}

/// Run a form's schema, returning per-field messages on failure
pub fn validate_form<T: Validate>(form: &T) -> Result<(), FieldErrors> {
    form.validate().map_err(|e| field_errors(&e))
}

/// Map wire field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "login" => "Login",
        "username" => "Username",
        "email" => "E-mail",
        "password" => "Password",
        "passwordConfirmation" => "Password confirmation",
        _ => field_name,
    }
}
