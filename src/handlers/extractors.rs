// src/handlers/extractors.rs
// DOCUMENTATION: Bearer token extractors
// PURPOSE: Resolve the calling user from the Authorization header

use crate::errors::AppError;
use crate::services::{Claims, TokenService};
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

/// Caller identified by a valid access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub claims: Claims,
}

/// Caller that may be anonymous
/// DOCUMENTATION: No header means anonymous, a bad token is still 401
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl OptionalUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.user_id)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.as_ref().map(|user| user.claims.sub.as_str())
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError::Unauthorized(message.to_string())
}

/// Verify the bearer token if one was sent
fn bearer_user(req: &HttpRequest) -> Result<Option<AuthenticatedUser>, AppError> {
    let header_value = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Ok(None),
    };

    let token = header_value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized("Invalid Authorization header"))?;

    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| AppError::InternalError("TokenService is not registered".to_string()))?;

    let claims = tokens.verify_access(token)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        log::warn!("Token subject is not a user id: {}", claims.sub);
        unauthorized("Invalid or expired token")
    })?;

    Ok(Some(AuthenticatedUser { user_id, claims }))
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(bearer_user(req).and_then(|user| {
            user.ok_or_else(|| unauthorized("Missing Authorization header"))
        }))
    }
}

impl FromRequest for OptionalUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(bearer_user(req).map(OptionalUser))
    }
}
