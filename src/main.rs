// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, cache and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use config::env::CacheBackend;
use config::Config;
use db::{PgPlaceRepository, PgUserRepository};
use services::{
    start_cleanup_task, LocationIqClient, MemoryCache, PlaceService, RedisCache, ResponseCache,
    TokenService, UserService,
};
use std::sync::Arc;

/// Build the configured response cache backend
async fn init_cache(config: &Config) -> anyhow::Result<Arc<dyn ResponseCache>> {
    match config.cache_backend().map_err(anyhow::Error::msg)? {
        CacheBackend::Redis => {
            let cache = RedisCache::connect(&config.redis_url(), config.redis_ttl)
                .await
                .context("Failed to connect to Redis")?;
            log::info!("Initialized Redis response cache (TTL: {}s)", config.redis_ttl);
            Ok(Arc::new(cache))
        }
        CacheBackend::Memory => {
            let cache = Arc::new(MemoryCache::new(config.redis_ttl));
            // Start background cleanup task (runs every 5 minutes)
            start_cleanup_task(cache.clone(), 300);
            log::info!(
                "Initialized in-process response cache (TTL: {}s)",
                config.redis_ttl
            );
            Ok(cache)
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration (.env is read inside from_env)
    let config = Config::from_env();

    // 2. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    log::info!("Starting {}...", config.project_name);
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 3. Initialize database connection pool
    let pool = config::init_db_pool(&config)
        .await
        .context("Failed to connect to database")?;

    // 4. Initialize response cache
    let cache = init_cache(&config).await?;

    // 5. Build services
    let tokens = web::Data::new(TokenService::from_config(&config)?);
    let locationiq = Arc::new(LocationIqClient::from_config(&config)?);
    let users = web::Data::new(UserService::new(Arc::new(PgUserRepository::new(
        pool.clone(),
    ))));
    let places = web::Data::new(PlaceService::new(
        Arc::new(PgPlaceRepository::new(pool.clone())),
        locationiq,
    ));
    let cache_data: web::Data<dyn ResponseCache> = web::Data::from(cache.clone());
    let config_data = web::Data::new(config.clone());

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let api_version = config.api_version.clone();

    log::info!("Serving API under /api/{}", api_version);

    HttpServer::new(move || {
        let api_version = api_version.clone();

        App::new()
            // Application state (config, services and cache)
            .app_data(config_data.clone())
            .app_data(tokens.clone())
            .app_data(users.clone())
            .app_data(places.clone())
            .app_data(cache_data.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(move |cfg| handlers::config(cfg, &api_version))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    // 7. Release shared connections
    log::info!("Shutting down, closing cache and database connections");
    cache.close().await;
    pool.close().await;

    Ok(())
}
