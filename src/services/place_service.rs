// src/services/place_service.rs
// DOCUMENTATION: Business logic for places
// PURPOSE: Intermediary between handlers, LocationIQ and the repository

use crate::db::PlaceRepository;
use crate::errors::AppError;
use crate::models::{
    FavoritePlaceResponse, NearbyPlaceRequest, NearbyPlaceResponse, PageQuery, Place,
    ProviderPlace, SearchHistory, SearchPlaceRequest, SearchPlaceResponse,
};
use crate::services::LocationIqClient;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct PlaceService {
    repository: Arc<dyn PlaceRepository>,
    client: Arc<LocationIqClient>,
}

impl PlaceService {
    pub fn new(repository: Arc<dyn PlaceRepository>, client: Arc<LocationIqClient>) -> Self {
        Self { repository, client }
    }

    /// Search places by free text
    /// DOCUMENTATION: Proxies LocationIQ /search, then records the results
    /// An empty result is NotFound
    pub async fn search_places(
        &self,
        request: &SearchPlaceRequest,
        user_id: Option<Uuid>,
    ) -> Result<Vec<SearchPlaceResponse>, AppError> {
        request.validate()?;

        let params = request.to_params(self.client.api_key());
        let raw = self.client.search(&params).await?;
        let places: Vec<SearchPlaceResponse> = Self::parse_places(raw)?;

        self.record_results(&places, user_id).await;
        Self::non_empty(places)
    }

    /// Places around a coordinate
    /// DOCUMENTATION: Proxies LocationIQ /nearby, then records the results
    pub async fn get_nearby_places(
        &self,
        request: &NearbyPlaceRequest,
        user_id: Option<Uuid>,
    ) -> Result<Vec<NearbyPlaceResponse>, AppError> {
        request.validate()?;

        let params = request.to_params(self.client.api_key());
        let raw = self.client.nearby(&params).await?;
        let places: Vec<NearbyPlaceResponse> = Self::parse_places(raw)?;

        self.record_results(&places, user_id).await;
        Self::non_empty(places)
    }

    pub async fn get_favorite_places(
        &self,
        user_id: Uuid,
        page: &PageQuery,
    ) -> Result<Vec<FavoritePlaceResponse>, AppError> {
        page.validate()?;

        let favorites = self
            .repository
            .list_favorites(user_id, page.limit, page.offset)
            .await?;

        if favorites.is_empty() {
            log::info!("User {} has no favorite places", user_id);
        } else {
            log::info!("User {} fetched {} favorite places", user_id, favorites.len());
        }

        Ok(favorites.iter().map(|f| f.to_response()).collect())
    }

    /// Bookmark a known place
    /// DOCUMENTATION: Conflict when the place is already a favorite of this user
    pub async fn save_favorite_place(
        &self,
        place: &Place,
        user_id: Uuid,
    ) -> Result<FavoritePlaceResponse, AppError> {
        match self.repository.insert_favorite(user_id, &place.place_id).await {
            Ok(favorite) => {
                log::info!("User {} added place {} to favorites", user_id, place.place_id);
                Ok(favorite.to_response())
            }
            Err(AppError::Conflict(_)) => {
                log::warn!(
                    "Place {} is already a favorite of user {}",
                    place.place_id,
                    user_id
                );
                Err(AppError::Conflict("Favorite place already exists".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn delete_favorite_place(
        &self,
        place_id: &str,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        if self.repository.delete_favorite(user_id, place_id).await? {
            log::info!("User {} removed place {} from favorites", user_id, place_id);
            return Ok(());
        }

        log::warn!(
            "Could not remove place {} from favorites of user {}",
            place_id,
            user_id
        );
        Err(AppError::NotFound("Favorite place not found".to_string()))
    }

    /// Lookup by provider place id
    pub async fn get_place_by_id(&self, place_id: &str) -> Result<Option<Place>, AppError> {
        let place = self.repository.find_place(place_id).await?;

        match &place {
            Some(_) => log::debug!("Place {} found", place_id),
            None => log::warn!("Place {} not found", place_id),
        }
        Ok(place)
    }

    /// Most recent searches first
    pub async fn get_search_history(
        &self,
        user_id: Uuid,
        page: &PageQuery,
    ) -> Result<Vec<SearchHistory>, AppError> {
        page.validate()?;

        let rows = self
            .repository
            .list_search_history(user_id, page.limit, page.offset)
            .await?;
        log::debug!("User {} fetched {} history rows", user_id, rows.len());
        Ok(rows)
    }

    /// Deserialize, normalize and validate provider items
    /// DOCUMENTATION: Any bad item rejects the whole payload with 502
    fn parse_places<T: ProviderPlace>(raw: Vec<Value>) -> Result<Vec<T>, AppError> {
        raw.into_iter()
            .map(|item| {
                let place = serde_json::from_value::<T>(item)
                    .map_err(|e| Self::bad_payload(e.to_string()))?
                    .normalized();
                place
                    .validate()
                    .map_err(|e| Self::bad_payload(e.to_string()))?;
                Ok(place)
            })
            .collect()
    }

    fn bad_payload(detail: String) -> AppError {
        log::error!("LocationIQ returned an invalid place: {}", detail);
        AppError::ExternalService {
            status: 502,
            message: "LocationIQ returned an invalid place".to_string(),
        }
    }

    fn non_empty<T>(places: Vec<T>) -> Result<Vec<T>, AppError> {
        if places.is_empty() {
            return Err(AppError::NotFound("Places not found".to_string()));
        }
        Ok(places)
    }

    /// Persist places and the caller's search history
    /// DOCUMENTATION: Best effort, failures are logged and never reach the caller
    async fn record_results<T: ProviderPlace>(&self, places: &[T], user_id: Option<Uuid>) {
        if places.is_empty() {
            return;
        }

        let new_places: Vec<_> = places.iter().map(|p| p.summary().to_new_place()).collect();
        match self.repository.save_places(&new_places).await {
            Ok(inserted) => log::info!("Stored {} new places", inserted),
            Err(e) => {
                log::error!("Failed to store places: {}", e);
                return;
            }
        }

        if let Some(user_id) = user_id {
            let place_ids: Vec<String> = places
                .iter()
                .map(|p| p.summary().place_id.clone())
                .collect();

            match self.repository.record_searches(user_id, &place_ids).await {
                Ok(written) => log::info!(
                    "Recorded {} search history rows for user {}",
                    written,
                    user_id
                ),
                Err(e) => log::error!(
                    "Failed to record search history for user {}: {}",
                    user_id,
                    e
                ),
            }
        }
    }
}
