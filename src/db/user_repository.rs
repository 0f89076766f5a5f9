// src/db/user_repository.rs
// DOCUMENTATION: User database operations
// PURPOSE: Lookup and creation of user accounts

use crate::db::repository::db_error;
use crate::errors::AppError;
use crate::models::{NewUser, User};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Fails with Conflict when the login is already taken
    async fn insert_user(&self, user: &NewUser) -> Result<User, AppError>;
}

/// PostgreSQL implementation of UserRepository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, password, first_name, last_name, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch user by login"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, password, first_name, last_name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch user by id"))
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, login, password, first_name, last_name, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, login, password, first_name, last_name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create user"))?;

        log::info!("Created user with id: {}", created.id);
        Ok(created)
    }
}
