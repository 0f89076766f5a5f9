// src/models/user.rs
// DOCUMENTATION: User records and authentication DTOs
// PURPOSE: Serialization and validation models for /auth endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents a user record from the database
/// DOCUMENTATION: Maps directly to the users table
/// `password` holds an Argon2 PHC string, never the plain password
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row to insert for a new user, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Request DTO for POST /auth/signup
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "value_error: login must be a valid email address"))]
    pub login: String,

    #[validate(length(min = 4, message = "value_error: password must have at least 4 characters"))]
    pub password: String,

    #[validate(length(
        min = 1,
        max = 50,
        message = "value_error: first_name must have 1 to 50 characters"
    ))]
    pub first_name: String,

    #[validate(length(
        min = 1,
        max = 50,
        message = "value_error: last_name must have 1 to 50 characters"
    ))]
    pub last_name: String,
}

impl CreateUserRequest {
    /// Strip surrounding whitespace before validation
    pub fn trimmed(self) -> Self {
        Self {
            login: self.login.trim().to_string(),
            password: self.password.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        }
    }
}

/// Request DTO for POST /auth/login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Token pair returned by signup and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}
