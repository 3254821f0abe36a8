use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - a registered identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamp.
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Public projection shown next to the posts this user owns.
    pub fn as_owner(&self) -> Owner {
        Owner {
            id: self.id,
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// The public part of a user, as embedded in post read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
