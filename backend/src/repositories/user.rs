//! User repository for database operations

use super::{NewUser, StoreError, StoreResult, UserRecord, UserStore};
use async_trait::async_trait;
use signgate_shared::UserField;
use sqlx::PgPool;
use uuid::Uuid;

const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// PostgreSQL-backed user directory
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a failed insert onto the field whose unique constraint fired
fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let fields = match db_err.constraint() {
                Some(USERNAME_CONSTRAINT) => vec![UserField::Username],
                Some(EMAIL_CONSTRAINT) => vec![UserField::Email],
                _ => vec![UserField::Username, UserField::Email],
            };
            return StoreError::UniqueViolation(fields);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_login(&self, login: &str, email: &str) -> StoreResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, password_salt, created_at, updated_at
            FROM users
            WHERE username = $1 OR email = $2
            ORDER BY (username = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(login)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, password_salt, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_conflicts(&self, username: &str, email: &str) -> StoreResult<Vec<UserField>> {
        let (username_taken, email_taken) = sqlx::query_as::<_, (bool, bool)>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE username = $1),
                   EXISTS(SELECT 1 FROM users WHERE email = $2)
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        let mut fields = Vec::new();
        if username_taken {
            fields.push(UserField::Username);
        }
        if email_taken {
            fields.push(UserField::Email);
        }
        Ok(fields)
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, email, password_hash, password_salt)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, password_salt, created_at, updated_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.password_salt)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn ping(&self) -> StoreResult<()> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(StoreError::Other)
    }
}
