// src/db/memory.rs
// DOCUMENTATION: In-memory repositories for tests
// PURPOSE: Same uniqueness semantics as the PostgreSQL schema, without a database

use crate::db::{PlaceRepository, UserRepository};
use crate::errors::AppError;
use crate::models::{FavoritePlace, NewPlace, NewUser, Place, SearchHistory, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(login).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.login) {
            return Err(AppError::Conflict(
                "duplicate key value violates users_login_unique".into(),
            ));
        }

        let created = User {
            id: Uuid::new_v4(),
            login: user.login.clone(),
            password: user.password_hash.clone(),
            first_name: Some(user.first_name.clone()),
            last_name: Some(user.last_name.clone()),
            created_at: Utc::now(),
        };
        users.insert(created.login.clone(), created.clone());
        Ok(created)
    }
}

#[derive(Default)]
struct PlaceTables {
    places: HashMap<String, Place>,
    history: HashMap<(Uuid, String), SearchHistory>,
    favorites: HashMap<(Uuid, String), FavoritePlace>,
}

/// Place tables behind one lock so each call stays atomic
#[derive(Default)]
pub struct MemoryPlaceRepository {
    tables: RwLock<PlaceTables>,
    fail_writes: AtomicBool,
}

impl MemoryPlaceRepository {
    /// Make save_places and record_searches fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn place_count(&self) -> usize {
        self.tables.read().await.places.len()
    }

    pub async fn history_count(&self, user_id: Uuid) -> usize {
        self.tables
            .read()
            .await
            .history
            .keys()
            .filter(|(owner, _)| *owner == user_id)
            .count()
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("simulated write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlaceRepository for MemoryPlaceRepository {
    async fn save_places(&self, places: &[NewPlace]) -> Result<u64, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;

        let mut inserted = 0;
        for place in places {
            if tables.places.contains_key(&place.place_id) {
                continue;
            }
            tables.places.insert(
                place.place_id.clone(),
                Place {
                    id: Uuid::new_v4(),
                    place_id: place.place_id.clone(),
                    lat: place.lat,
                    lon: place.lon,
                    display_name: Some(place.display_name.clone()),
                    place_class: place.place_class.clone(),
                    place_type: place.place_type.clone(),
                    created_at: Utc::now(),
                },
            );
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn record_searches(&self, user_id: Uuid, place_ids: &[String]) -> Result<u64, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;

        if let Some(missing) = place_ids.iter().find(|id| !tables.places.contains_key(*id)) {
            return Err(AppError::DatabaseError(format!(
                "foreign key violation: place {} does not exist",
                missing
            )));
        }

        for place_id in place_ids {
            let now = Utc::now();
            tables
                .history
                .entry((user_id, place_id.clone()))
                .and_modify(|row| row.search_date = now)
                .or_insert_with(|| SearchHistory {
                    id: Uuid::new_v4(),
                    user_id,
                    place_id: place_id.clone(),
                    search_date: now,
                });
        }
        Ok(place_ids.len() as u64)
    }

    async fn find_place(&self, place_id: &str) -> Result<Option<Place>, AppError> {
        Ok(self.tables.read().await.places.get(place_id).cloned())
    }

    async fn list_favorites(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FavoritePlace>, AppError> {
        let tables = self.tables.read().await;
        let mut favorites: Vec<FavoritePlace> = tables
            .favorites
            .values()
            .filter(|favorite| favorite.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(favorites
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn insert_favorite(
        &self,
        user_id: Uuid,
        place_id: &str,
    ) -> Result<FavoritePlace, AppError> {
        let mut tables = self.tables.write().await;
        let key = (user_id, place_id.to_string());

        if tables.favorites.contains_key(&key) {
            return Err(AppError::Conflict(
                "duplicate key value violates favorite_places_user_place_unique".into(),
            ));
        }

        let favorite = FavoritePlace {
            id: Uuid::new_v4(),
            user_id,
            place_id: place_id.to_string(),
            created_at: Utc::now(),
        };
        tables.favorites.insert(key, favorite.clone());
        Ok(favorite)
    }

    async fn delete_favorite(&self, user_id: Uuid, place_id: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .favorites
            .remove(&(user_id, place_id.to_string()))
            .is_some())
    }

    async fn list_search_history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SearchHistory>, AppError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<SearchHistory> = tables
            .history
            .values()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.search_date.cmp(&a.search_date));

        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}
