//! Database repositories
//!
//! Provides the user directory behind the [`UserStore`] trait, with a
//! PostgreSQL implementation for deployments and an in-memory one for tests
//! and local runs without a database.
//!
//! Emails passed to a store are expected to be normalized already (see
//! `signgate_shared::validation::normalize_email`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signgate_shared::{PublicUser, UserField};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod user;

pub use memory::InMemoryUserStore;
pub use user::UserRepository;

/// User record as persisted
#[derive(Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Fields safe to return to clients
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

/// Input for creating a user
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
}

/// Store failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// The write collided with an existing user on these fields
    #[error("Unique constraint violated on {0:?}")]
    UniqueViolation(Vec<UserField>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The user directory
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the user whose username equals `login` or whose email equals
    /// `email`. An exact username match wins over an email match.
    async fn find_by_login(&self, login: &str, email: &str) -> StoreResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    async fn username_exists(&self, username: &str) -> StoreResult<bool>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Which of `username` / `email` already belong to some user
    async fn find_conflicts(&self, username: &str, email: &str) -> StoreResult<Vec<UserField>>;

    /// Insert a user; fails with [`StoreError::UniqueViolation`] on a
    /// duplicate username or email, however the race was lost.
    async fn create(&self, new_user: NewUser) -> StoreResult<UserRecord>;

    /// Cheap reachability check for readiness probes
    async fn ping(&self) -> StoreResult<()>;
}
