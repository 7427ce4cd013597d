//! Dashboard user model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Stored lowercase; uniqueness is case-insensitive.
    pub email: String,
    /// Argon2id PHC string. Never serialised into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    /// Already hashed by the identity layer; the store never sees a
    /// raw password.
    pub password_hash: String,
}
