// src/models/teacher.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'teachers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Teacher {
    /// UUID v4 as text.
    pub id: String,

    pub name: String,

    /// Unique across teachers.
    pub email: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for both registration and login.
/// Name and email together act as the credentials.
#[derive(Debug, Deserialize, Validate)]
pub struct TeacherCredentials {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Name length must be between 1 and 200 characters."
    ))]
    pub name: String,
    #[validate(
        email(message = "Email is not valid."),
        length(max = 200, message = "Email must be at most 200 characters.")
    )]
    pub email: String,
}

impl TeacherCredentials {
    /// Strips surrounding whitespace so a blank name fails validation.
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}
