use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::{Email, UserRole};

/// A registered account
///
/// The password is only ever held as a bcrypt hash and is never
/// serialized into API responses.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub email: Email,
    pub full_name: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds a new, enabled user with fresh timestamps
    pub fn new(
        username: String,
        password_hash: String,
        email: Email,
        full_name: String,
        role: UserRole,
        phone_number: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            email,
            full_name,
            role,
            phone_number,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }
}
