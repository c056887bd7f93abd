//! Signgate WASM Module
//!
//! Client-side form validation for the sign-in and sign-up forms. The forms
//! run the same schema the server enforces, so a submission that passes here
//! only fails server-side on conflicts or bad credentials.

use serde::de::DeserializeOwned;
use signgate_shared::validation::{
    get_field_display_label, normalize_email, validate_form, Validate,
};
use signgate_shared::{FieldErrors, FormError, SignInRequest, SignUpRequest};
use wasm_bindgen::prelude::*;

fn check<T: DeserializeOwned + Validate>(form_json: &str) -> Result<T, FormError> {
    let form: T =
        serde_json::from_str(form_json).map_err(|e| FormError::Malformed(e.to_string()))?;
    validate_form(&form).map_err(FormError::Invalid)?;
    Ok(form)
}

fn render(result: Result<(), FormError>) -> String {
    let errors = match result {
        Ok(()) => FieldErrors::new(),
        Err(FormError::Invalid(errors)) => errors,
        Err(FormError::Malformed(msg)) => {
            let mut errors = FieldErrors::new();
            errors.insert("form".to_string(), vec![msg]);
            errors
        }
    };
    serde_json::to_string(&errors).unwrap_or_else(|_| "{}".to_string())
}

/// Validate the sign-in form
///
/// Takes `{ login, password }` as JSON and returns a JSON object mapping each
/// invalid field to its messages (`{}` when the form is valid).
#[wasm_bindgen]
pub fn validate_sign_in(form_json: &str) -> String {
    render(check::<SignInRequest>(form_json).map(|_| ()))
}

/// Validate the sign-up form
///
/// Takes `{ username, email, password, passwordConfirmation }` as JSON.
#[wasm_bindgen]
pub fn validate_sign_up(form_json: &str) -> String {
    render(check::<SignUpRequest>(form_json).map(|_| ()))
}

/// Lower-case and trim an email the way the server stores it
#[wasm_bindgen]
pub fn canonical_email(email: &str) -> String {
    normalize_email(email)
}

/// Human-readable label for a field name returned in error responses
#[wasm_bindgen]
pub fn field_label(field: &str) -> String {
    get_field_display_label(field).to_string()
}
