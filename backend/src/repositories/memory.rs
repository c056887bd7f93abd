//! In-memory user directory
//!
//! Enforces the same invariants as the database schema: unique username,
//! unique lower-cased email. The uniqueness check and the insert happen under
//! one write lock, standing in for the table's unique constraints.

use super::{NewUser, StoreError, StoreResult, UserRecord, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use signgate_shared::UserField;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    fn conflicts(users: &[UserRecord], username: &str, email: &str) -> Vec<UserField> {
        let mut fields = Vec::new();
        if users.iter().any(|u| u.username == username) {
            fields.push(UserField::Username);
        }
        if users.iter().any(|u| u.email == email) {
            fields.push(UserField::Email);
        }
        fields
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_login(&self, login: &str, email: &str) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        let by_username = users.iter().find(|u| u.username == login);
        Ok(by_username
            .or_else(|| users.iter().find(|u| u.email == email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.users.read().await.iter().any(|u| u.email == email))
    }

    async fn find_conflicts(&self, username: &str, email: &str) -> StoreResult<Vec<UserField>> {
        Ok(Self::conflicts(&self.users.read().await, username, email))
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<UserRecord> {
        if new_user.email != new_user.email.to_lowercase() {
            return Err(StoreError::Other(anyhow::anyhow!(
                "Email must be stored lower-cased"
            )));
        }

        let mut users = self.users.write().await;
        let conflicts = Self::conflicts(&users, &new_user.username, &new_user.email);
        if !conflicts.is_empty() {
            return Err(StoreError::UniqueViolation(conflicts));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            password_salt: new_user.password_salt,
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
