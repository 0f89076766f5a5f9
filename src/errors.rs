// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Every failure a handler can surface
/// Each variant maps to one HTTP status code and a JSON error envelope
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad credentials, missing or invalid bearer token
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed request input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Uniqueness violation on a user-initiated write
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Geocoding provider failure; `status` is the upstream status,
    /// 503 for network failures or 502 for unusable payloads
    #[error("{message}")]
    ExternalService { status: u16, message: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Message exposed to API consumers
    /// Server-side failures never leak their details
    fn public_message(&self) -> String {
        match self {
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Convert AppError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() && !matches!(self, AppError::ExternalService { .. }) {
            log::error!("Unhandled error: {:?}", self);
        }

        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalService { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

/// Unique-constraint violations become conflicts, everything else is a
/// database failure
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                AppError::Conflict(db_error.message().to_string())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::InternalError(error.to_string())
    }
}
