// src/db/repository.rs
// DOCUMENTATION: Database access layer for places, search history and favorites
// PURPOSE: Abstract database operations from business logic

use crate::errors::AppError;
use crate::models::{FavoritePlace, NewPlace, Place, SearchHistory};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Persistence operations the place service relies on
/// DOCUMENTATION: Every method is atomic - fully applied or fully rolled back
#[async_trait]
pub trait PlaceRepository: Send + Sync {
    /// Insert places not seen before; existing place_ids are left untouched
    /// Returns the number of newly inserted rows
    async fn save_places(&self, places: &[NewPlace]) -> Result<u64, AppError>;

    /// Upsert one history row per place, refreshing search_date on repeats
    async fn record_searches(&self, user_id: Uuid, place_ids: &[String]) -> Result<u64, AppError>;

    async fn find_place(&self, place_id: &str) -> Result<Option<Place>, AppError>;

    async fn list_favorites(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FavoritePlace>, AppError>;

    /// Fails with Conflict when the (user, place) pair already exists
    async fn insert_favorite(&self, user_id: Uuid, place_id: &str)
        -> Result<FavoritePlace, AppError>;

    /// Returns false when there was nothing to delete
    async fn delete_favorite(&self, user_id: Uuid, place_id: &str) -> Result<bool, AppError>;

    /// Most recent searches first
    async fn list_search_history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SearchHistory>, AppError>;
}

/// Log and convert a driver error
/// Conflicts are expected outcomes and are left to the caller to report
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let err = AppError::from(e);
        if !matches!(err, AppError::Conflict(_)) {
            log::error!("{}: {}", context, err);
        }
        err
    }
}

/// PostgreSQL implementation of PlaceRepository
pub struct PgPlaceRepository {
    pool: PgPool,
}

impl PgPlaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaceRepository for PgPlaceRepository {
    async fn save_places(&self, places: &[NewPlace]) -> Result<u64, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to open transaction for places"))?;

        let mut inserted = 0;
        for place in places {
            let result = sqlx::query(
                r#"
                INSERT INTO places (id, place_id, lat, lon, display_name, place_class, place_type, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
                ON CONFLICT (place_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&place.place_id)
            .bind(place.lat)
            .bind(place.lon)
            .bind(&place.display_name)
            .bind(&place.place_class)
            .bind(&place.place_type)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to insert place"))?;

            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit places"))?;

        log::debug!("Saved {} new places out of {}", inserted, places.len());
        Ok(inserted)
    }

    async fn record_searches(&self, user_id: Uuid, place_ids: &[String]) -> Result<u64, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to open transaction for search history"))?;

        let mut written = 0;
        for place_id in place_ids {
            let result = sqlx::query(
                r#"
                INSERT INTO search_history (id, user_id, place_id, search_date)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (user_id, place_id) DO UPDATE
                SET search_date = EXCLUDED.search_date
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(place_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to record search history"))?;

            written += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit search history"))?;

        Ok(written)
    }

    async fn find_place(&self, place_id: &str) -> Result<Option<Place>, AppError> {
        sqlx::query_as::<_, Place>(
            r#"
            SELECT id, place_id, lat, lon, display_name, place_class, place_type, created_at
            FROM places
            WHERE place_id = $1
            "#,
        )
        .bind(place_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch place"))
    }

    async fn list_favorites(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FavoritePlace>, AppError> {
        sqlx::query_as::<_, FavoritePlace>(
            r#"
            SELECT id, user_id, place_id, created_at
            FROM favorite_places
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list favorite places"))
    }

    async fn insert_favorite(
        &self,
        user_id: Uuid,
        place_id: &str,
    ) -> Result<FavoritePlace, AppError> {
        sqlx::query_as::<_, FavoritePlace>(
            r#"
            INSERT INTO favorite_places (id, user_id, place_id, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, user_id, place_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(place_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to insert favorite place"))
    }

    async fn delete_favorite(&self, user_id: Uuid, place_id: &str) -> Result<bool, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to open transaction for favorite delete"))?;

        let rows = sqlx::query("DELETE FROM favorite_places WHERE user_id = $1 AND place_id = $2")
            .bind(user_id)
            .bind(place_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete favorite place"))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(db_error("Failed to commit favorite delete"))?;

        Ok(rows > 0)
    }

    async fn list_search_history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SearchHistory>, AppError> {
        sqlx::query_as::<_, SearchHistory>(
            r#"
            SELECT id, user_id, place_id, search_date
            FROM search_history
            WHERE user_id = $1
            ORDER BY search_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list search history"))
    }
}
