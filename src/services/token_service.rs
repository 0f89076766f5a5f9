// src/services/token_service.rs
// DOCUMENTATION: Access/refresh token issuing and verification
// PURPOSE: Stateless HMAC-signed JWTs carrying the user id as subject

use crate::config::Config;
use crate::errors::AppError;
use crate::models::TokenResponse;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub const ACCESS_TOKEN_TYPE: &str = "access";
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

/// Token issuer
/// DOCUMENTATION: Built once from Config and shared through web::Data
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenService {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm).map_err(|e| {
            AppError::InternalError(format!(
                "Invalid JWT algorithm {}: {}",
                config.jwt_algorithm, e
            ))
        })?;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: config.access_token_expires,
            refresh_ttl: config.refresh_token_expires,
        })
    }

    /// Issue an access and a refresh token for the subject
    pub fn create_tokens(&self, subject: &str) -> Result<TokenResponse, AppError> {
        Ok(TokenResponse {
            access_token: self.sign(subject, ACCESS_TOKEN_TYPE, self.access_ttl)?,
            refresh_token: self.sign(subject, REFRESH_TOKEN_TYPE, self.refresh_ttl)?,
        })
    }

    fn sign(&self, subject: &str, token_type: &str, ttl: i64) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl,
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            log::error!("Failed to sign {} token: {}", token_type, e);
            AppError::InternalError(format!("Failed to sign token: {}", e))
        })
    }

    /// Decode an access token, checking signature, expiry and token type
    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_nbf = true;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            log::warn!("Rejected bearer token: {}", e);
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            log::warn!("Rejected {} token used as access token", data.claims.token_type);
            return Err(AppError::Unauthorized("Invalid or expired token".to_string()));
        }

        Ok(data.claims)
    }
}
