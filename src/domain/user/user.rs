use chrono::{DateTime, Utc};
use serde::Serialize;

use super::value_objects::Email;

/// User entity
///
/// `password` holds the bcrypt hash and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub email: Email,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds a new user with both timestamps set to now
    pub fn new(id: impl Into<String>, email: Email, password: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email,
            password: password.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
