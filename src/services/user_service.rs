// src/services/user_service.rs
// DOCUMENTATION: Account business logic
// PURPOSE: Signup, credential checks and user lookup

use crate::db::UserRepository;
use crate::errors::AppError;
use crate::models::{CreateUserRequest, NewUser, User};
use crate::services::password::{hash_password, verify_dummy_password, verify_password};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const BAD_CREDENTIALS: &str = "Incorrect username or password";

/// User service
/// DOCUMENTATION: Coordinates password hashing and the user repository
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Check login/password and return the matching user
    /// DOCUMENTATION: Unknown login and wrong password produce the same error
    /// and both run one Argon2 verification. The password is checked as sent.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AppError> {
        let login = login.trim();

        let user = match self.repository.find_by_login(login).await? {
            Some(user) => user,
            None => {
                verify_dummy_password(password);
                log::warn!("Login attempt for unknown user {}", login);
                return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(&user.password, password)? {
            log::warn!("Wrong password for user {}", user.id);
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        log::info!("User {} authenticated", user.id);
        Ok(user)
    }

    /// Validate, hash and persist a new account
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, AppError> {
        let request = request.trimmed();
        request.validate()?;

        let new_user = NewUser {
            login: request.login,
            password_hash: hash_password(&request.password)?,
            first_name: request.first_name,
            last_name: request.last_name,
        };

        match self.repository.insert_user(&new_user).await {
            Ok(user) => {
                log::info!(
                    "Created user {} ({} {}) at {}",
                    user.id,
                    user.first_name.as_deref().unwrap_or_default(),
                    user.last_name.as_deref().unwrap_or_default(),
                    user.created_at
                );
                Ok(user)
            }
            Err(AppError::Conflict(_)) => {
                log::warn!("Signup rejected, login {} already exists", new_user.login);
                Err(AppError::Conflict("User already exists".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        log::debug!("Fetching user: {}", id);
        self.repository.find_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryUserRepository;
    use crate::services::password::verify_calls;
    use tokio_test::assert_ok;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryUserRepository::default()))
    }

    fn signup(login: &str) -> CreateUserRequest {
        CreateUserRequest {
            login: login.to_string(),
            password: "Passw0rd".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_authenticate() {
        let service = service();
        let created = assert_ok!(service.create_user(signup("ada@test.com")).await);
        assert_ne!(created.password, "Passw0rd");

        let user = assert_ok!(service.authenticate("ada@test.com", "Passw0rd").await);
        assert_eq!(user.id, created.id);

        let found = service.get_user_by_id(created.id).await.unwrap();
        assert_eq!(found.map(|u| u.login), Some("ada@test.com".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_login_is_conflict() {
        let service = service();
        service.create_user(signup("ada@test.com")).await.unwrap();

        match service.create_user(signup("ada@test.com")).await {
            Err(AppError::Conflict(message)) => assert_eq!(message, "User already exists"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_credentials_are_indistinguishable() {
        let service = service();
        service.create_user(signup("ada@test.com")).await.unwrap();

        let wrong_password = service.authenticate("ada@test.com", "nope").await.unwrap_err();
        let unknown_user = service.authenticate("bob@test.com", "Passw0rd").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), BAD_CREDENTIALS);
        assert_eq!(unknown_user.to_string(), wrong_password.to_string());
    }

    #[tokio::test]
    async fn test_unknown_login_runs_password_verification() {
        let service = service();
        service.create_user(signup("ada@test.com")).await.unwrap();

        let before = verify_calls();
        service.authenticate("ada@test.com", "nope").await.unwrap_err();
        let wrong_password_calls = verify_calls() - before;

        let before = verify_calls();
        service.authenticate("bob@test.com", "nope").await.unwrap_err();
        let unknown_user_calls = verify_calls() - before;

        assert_eq!(wrong_password_calls, 1);
        assert_eq!(unknown_user_calls, wrong_password_calls);
    }

    #[tokio::test]
    async fn test_login_password_is_not_trimmed() {
        let service = service();
        service.create_user(signup("ada@test.com")).await.unwrap();

        let padded = service.authenticate("ada@test.com", "  Passw0rd  ").await;
        assert!(matches!(padded, Err(AppError::Unauthorized(_))));
        assert_ok!(service.authenticate("ada@test.com", "Passw0rd").await);
    }

    #[tokio::test]
    async fn test_invalid_signup_is_rejected() {
        let mut request = signup("not-an-email");
        request.password = "abc".to_string();

        assert!(matches!(
            service().create_user(request).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
