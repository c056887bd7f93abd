//! Data models for the Signgate application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields of a user account that must be unique across all users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserField {
    Username,
    Email,
}

impl UserField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserField::Username => "username",
            UserField::Email => "email",
        }
    }

    /// Message shown next to the field when the value is already taken
    pub fn taken_message(&self) -> &'static str {
        match self {
            UserField::Username => "Username is already taken",
            UserField::Email => "Email is already registered",
        }
    }
}

impl std::fmt::Display for UserField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public view of a user account.
///
/// Password material never leaves the server, so it has no place here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
