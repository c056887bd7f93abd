//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and external systems. They are plain async functions
//! returning `Result<T, ApiError>` and know nothing about HTTP.

pub mod user;

pub use user::UserService;
