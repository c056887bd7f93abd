//! Signgate Shared Library
//!
//! This crate contains the request/response types and the validation schema
//! shared by the backend and the WASM form layer.

pub mod errors;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::{PublicUser, UserField};
pub use types::*;
