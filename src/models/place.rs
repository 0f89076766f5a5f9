// src/models/place.rs
// DOCUMENTATION: Core data structures for places, search history and favorites
// PURPOSE: Defines all serialization/deserialization models for API, provider and database

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Represents a place record from the database
/// DOCUMENTATION: Maps directly to the places table in PostgreSQL
/// Rows are created the first time a provider result is seen
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Place {
    pub id: Uuid,

    /// Provider place identifier (unique)
    pub place_id: String,

    pub lat: f64,

    pub lon: f64,

    pub display_name: Option<String>,

    /// Provider class tag, e.g. "amenity"
    pub place_class: Option<String>,

    /// Provider type tag, e.g. "restaurant"
    pub place_type: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Place row to insert, built from a validated provider result
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlace {
    pub place_id: String,
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    pub place_class: Option<String>,
    pub place_type: Option<String>,
}

/// One (user, place) search association
/// DOCUMENTATION: Maps to search_history, unique per (user_id, place_id)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub place_id: String,
    pub search_date: DateTime<Utc>,
}

/// A user bookmark on a known place
/// DOCUMENTATION: Maps to favorite_places, unique per (user_id, place_id)
#[derive(Debug, Clone, FromRow)]
pub struct FavoritePlace {
    pub id: Uuid,
    pub user_id: Uuid,
    pub place_id: String,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for favorite endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritePlaceResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub place_id: String,
    pub created_at: DateTime<Utc>,
}

impl FavoritePlace {
    pub fn to_response(&self) -> FavoritePlaceResponse {
        FavoritePlaceResponse {
            id: self.id,
            user_id: self.user_id,
            place_id: self.place_id.clone(),
            created_at: self.created_at,
        }
    }
}

/// Request body for POST /places/favorite
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FavoritePlaceCreate {
    #[validate(length(min = 1, max = 255))]
    pub place_id: String,
}

fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(ValidationError::new("latitude_out_of_range"))
    }
}

fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(ValidationError::new("longitude_out_of_range"))
    }
}

fn default_limit() -> u32 {
    10
}

fn default_radius() -> u32 {
    500
}

/// Query parameters for GET /places/search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchPlaceRequest {
    /// Free-text search query
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,

    /// Maximum number of results
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: u32,
}

impl SearchPlaceRequest {
    /// LocationIQ /search parameters
    pub fn to_params(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("key", api_key.to_string()),
            ("q", self.query.trim().to_string()),
            ("limit", self.limit.to_string()),
            ("format", "json".to_string()),
        ]
    }
}

/// Query parameters for GET /places/nearby
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NearbyPlaceRequest {
    #[validate(custom = "validate_latitude")]
    pub lat: f64,

    #[validate(custom = "validate_longitude")]
    pub lon: f64,

    /// Comma-separated tag filter, e.g. "amenity:*,!amenity:gym"
    #[serde(default)]
    pub tags: Option<String>,

    /// Search radius in meters
    #[serde(default = "default_radius")]
    #[validate(range(min = 100, max = 5000))]
    pub radius: u32,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: u32,
}

impl NearbyPlaceRequest {
    /// Individual tags with blanks removed
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// LocationIQ /nearby parameters
    pub fn to_params(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("key", api_key.to_string()),
            ("lat", self.lat.to_string()),
            ("lon", self.lon.to_string()),
            ("tag", self.tag_list().join(",")),
            ("radius", self.radius.to_string()),
            ("limit", self.limit.to_string()),
            ("format", "json".to_string()),
        ]
    }
}

/// Pagination for GET /places/favorite and GET /places/history
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PageQuery {
    #[serde(default = "default_page_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
}

fn default_page_limit() -> i64 {
    100
}

// Provider payloads encode numbers as strings ("lat": "52.5170365").

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn f64_from_any<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

fn opt_f64_from_any<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Integer(u64),
}

fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match IdValue::deserialize(deserializer)? {
        IdValue::Text(s) => s,
        IdValue::Integer(n) => n.to_string(),
    })
}

/// Fields shared by every provider result
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlaceSummary {
    #[serde(deserialize_with = "id_from_any")]
    #[validate(length(min = 1, max = 255))]
    pub place_id: String,

    #[serde(deserialize_with = "f64_from_any")]
    #[validate(custom = "validate_latitude")]
    pub lat: f64,

    #[serde(deserialize_with = "f64_from_any")]
    #[validate(custom = "validate_longitude")]
    pub lon: f64,

    #[validate(length(min = 1))]
    pub display_name: String,

    #[serde(rename = "class", default)]
    pub place_class: Option<String>,

    #[serde(rename = "type", default)]
    pub place_type: Option<String>,
}

impl PlaceSummary {
    fn trimmed(self) -> Self {
        Self {
            place_id: self.place_id.trim().to_string(),
            display_name: self.display_name.trim().to_string(),
            ..self
        }
    }

    pub fn to_new_place(&self) -> NewPlace {
        NewPlace {
            place_id: self.place_id.clone(),
            lat: self.lat,
            lon: self.lon,
            display_name: self.display_name.clone(),
            place_class: self.place_class.clone(),
            place_type: self.place_type.clone(),
        }
    }
}

/// Item of GET /places/search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchPlaceResponse {
    #[serde(flatten)]
    #[validate]
    pub place: PlaceSummary,

    #[serde(default, deserialize_with = "opt_f64_from_any")]
    pub importance: Option<f64>,
}

fn default_place_name() -> Option<String> {
    Some("No name".to_string())
}

/// Item of GET /places/nearby
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NearbyPlaceResponse {
    #[serde(flatten)]
    #[validate]
    pub place: PlaceSummary,

    #[serde(default = "default_place_name")]
    pub name: Option<String>,

    /// Distance from the requested point in meters
    #[serde(default, deserialize_with = "opt_f64_from_any")]
    pub distance: Option<f64>,
}

/// A provider result type the place service can validate and persist
pub trait ProviderPlace: DeserializeOwned + Serialize + Validate {
    fn summary(&self) -> &PlaceSummary;

    /// Whitespace-normalized copy, applied before validation
    fn normalized(self) -> Self;
}

impl ProviderPlace for SearchPlaceResponse {
    fn summary(&self) -> &PlaceSummary {
        &self.place
    }

    fn normalized(self) -> Self {
        Self {
            place: self.place.trimmed(),
            ..self
        }
    }
}

impl ProviderPlace for NearbyPlaceResponse {
    fn summary(&self) -> &PlaceSummary {
        &self.place
    }

    fn normalized(self) -> Self {
        Self {
            place: self.place.trimmed(),
            ..self
        }
    }
}
