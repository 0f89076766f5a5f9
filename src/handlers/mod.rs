// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Route registration and request extractor configuration

pub mod auth;
pub mod extractors;
pub mod health;
pub mod places;

use crate::errors::AppError;
use actix_web::web;

pub use auth::config as auth_config;
pub use health::config as health_config;
pub use places::config as places_config;

/// Register every route under /api/{api_version}
/// DOCUMENTATION: Malformed JSON bodies, query strings and path segments
/// are answered through AppError as 422
pub fn config(cfg: &mut web::ServiceConfig, api_version: &str) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .service(
        web::scope(&format!("/api/{}", api_version))
            .configure(health_config)
            .configure(auth_config)
            .configure(places_config),
    );
}
