use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{self, PASSWORD_MIN_LEN, USERNAME_MAX_LEN, ValidationErrors};

/// User entity - an account that can sign in, author posts and comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Account registration input, checked before any password is hashed.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = self.username.trim().to_string();
        validation::check_text(&mut errors, "username", &username, USERNAME_MAX_LEN);
        validation::check_email(&mut errors, "email", &self.email);
        if self.password.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password",
                format!("Ensure this field has at least {PASSWORD_MIN_LEN} characters."),
            );
        }

        errors.into_result(Self {
            username,
            email: self.email.trim().to_string(),
            password: self.password,
        })
    }
}
