use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::millis_to_datetime;

/// User stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub username: String,
    /// Lowercased, trimmed
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// When the user was created (Unix milliseconds)
    pub created_at: i64,
}

/// User model for API responses; never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_row(id: u64, row: &UserRow) -> Self {
        Self {
            id,
            username: row.username.clone(),
            email: row.email.clone(),
            created_at: millis_to_datetime(row.created_at),
        }
    }

    /// Canonical form used for the unique email index
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}
