// src/handlers/places.rs
// DOCUMENTATION: HTTP handlers for place operations
// PURPOSE: Parse requests, call services, return responses

use crate::config::Config;
use crate::errors::AppError;
use crate::handlers::extractors::{AuthenticatedUser, OptionalUser};
use crate::models::{FavoritePlaceCreate, NearbyPlaceRequest, PageQuery, SearchPlaceRequest};
use crate::services::{build_cache_key, PlaceService, ResponseCache, UserService};
use actix_web::{http::header::ContentType, web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;
use std::future::Future;
use validator::Validate;

/// Cache key for the current request and caller
fn request_cache_key(req: &HttpRequest, config: &Config, user: &OptionalUser) -> String {
    let query = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();

    build_cache_key(
        &config.cache_namespace,
        user.subject(),
        req.method().as_str(),
        req.path(),
        &query,
    )
}

/// Serve from cache, or run `load` and cache its successful result
async fn cached_json<T, F>(
    cache: &dyn ResponseCache,
    key: String,
    load: F,
) -> Result<HttpResponse, AppError>
where
    T: Serialize,
    F: Future<Output = Result<T, AppError>>,
{
    if let Some(body) = cache.get(&key).await {
        return Ok(HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(body));
    }

    let body = serde_json::to_string(&load.await?)?;
    cache.set(&key, &body).await;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

/// GET /places/search
/// Search places by name through LocationIQ (cached)
pub async fn search_places(
    req: HttpRequest,
    user: OptionalUser,
    query: web::Query<SearchPlaceRequest>,
    service: web::Data<PlaceService>,
    cache: web::Data<dyn ResponseCache>,
    config: web::Data<Config>,
) -> Result<impl Responder, AppError> {
    let key = request_cache_key(&req, &config, &user);
    let user_id = user.user_id();

    cached_json(cache.get_ref(), key, async move {
        let places = service.search_places(&query, user_id).await?;
        log::info!(
            "User {} received {} places",
            user.subject().unwrap_or("anonymous"),
            places.len()
        );
        Ok(places)
    })
    .await
}

/// GET /places/nearby
/// Places around a coordinate through LocationIQ (cached)
pub async fn get_nearby_places(
    req: HttpRequest,
    user: OptionalUser,
    query: web::Query<NearbyPlaceRequest>,
    service: web::Data<PlaceService>,
    cache: web::Data<dyn ResponseCache>,
    config: web::Data<Config>,
) -> Result<impl Responder, AppError> {
    let key = request_cache_key(&req, &config, &user);
    let user_id = user.user_id();

    cached_json(cache.get_ref(), key, async move {
        let places = service.get_nearby_places(&query, user_id).await?;
        log::info!(
            "User {} received {} nearby places",
            user.subject().unwrap_or("anonymous"),
            places.len()
        );
        Ok(places)
    })
    .await
}

/// GET /places/favorite
pub async fn get_favorite_places(
    user: AuthenticatedUser,
    page: web::Query<PageQuery>,
    service: web::Data<PlaceService>,
) -> Result<impl Responder, AppError> {
    let favorites = service.get_favorite_places(user.user_id, &page).await?;
    Ok(HttpResponse::Ok().json(favorites))
}

/// POST /places/favorite
/// The place must have been returned by an earlier search
pub async fn save_favorite_place(
    user: AuthenticatedUser,
    body: web::Json<FavoritePlaceCreate>,
    service: web::Data<PlaceService>,
    users: web::Data<UserService>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    if users.get_user_by_id(user.user_id).await?.is_none() {
        log::warn!("Token subject {} has no user record", user.user_id);
        return Err(AppError::Unauthorized("User not found".to_string()));
    }

    let place = service
        .get_place_by_id(&body.place_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Place not found".to_string()))?;

    let favorite = service.save_favorite_place(&place, user.user_id).await?;
    Ok(HttpResponse::Created().json(favorite))
}

/// DELETE /places/favorite/{place_id}
pub async fn delete_favorite_place(
    user: AuthenticatedUser,
    path: web::Path<String>,
    service: web::Data<PlaceService>,
) -> Result<impl Responder, AppError> {
    service
        .delete_favorite_place(&path.into_inner(), user.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::Value::Null))
}

/// GET /places/history
/// The caller's search history, most recent first
pub async fn get_search_history(
    user: AuthenticatedUser,
    page: web::Query<PageQuery>,
    service: web::Data<PlaceService>,
) -> Result<impl Responder, AppError> {
    let history = service.get_search_history(user.user_id, &page).await?;
    Ok(HttpResponse::Ok().json(history))
}

/// Configuration for place routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/places")
            .route("/search", web::get().to(search_places))
            .route("/nearby", web::get().to(get_nearby_places))
            .route("/favorite", web::get().to(get_favorite_places))
            .route("/favorite", web::post().to(save_favorite_place))
            .route("/favorite/{place_id}", web::delete().to(delete_favorite_place))
            .route("/history", web::get().to(get_search_history)),
    );
}
