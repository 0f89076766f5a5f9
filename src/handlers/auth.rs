// src/handlers/auth.rs
// DOCUMENTATION: HTTP handlers for account operations
// PURPOSE: Signup and login, both answer with a token pair

use crate::errors::AppError;
use crate::models::{CreateUserRequest, LoginRequest};
use crate::services::{TokenService, UserService};
use actix_web::{web, HttpResponse, Responder};

/// POST /auth/signup
/// Create an account and log it in
pub async fn signup(
    users: web::Data<UserService>,
    tokens: web::Data<TokenService>,
    req: web::Json<CreateUserRequest>,
) -> Result<impl Responder, AppError> {
    let user = users.create_user(req.into_inner()).await?;
    let pair = tokens.create_tokens(&user.id.to_string())?;

    log::info!("User {} signed up", user.id);
    Ok(HttpResponse::Created().json(pair))
}

/// POST /auth/login
/// Exchange credentials for a token pair
pub async fn login(
    users: web::Data<UserService>,
    tokens: web::Data<TokenService>,
    req: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let user = users.authenticate(&req.login, &req.password).await?;
    let pair = tokens.create_tokens(&user.id.to_string())?;

    Ok(HttpResponse::Ok().json(pair))
}

/// Configuration for auth routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login)),
    );
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{test_app, TestState};
    use crate::models::TokenResponse;
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    fn signup_body(login: &str) -> Value {
        json!({
            "login": login,
            "password": "Passw0rd",
            "first_name": "Ada",
            "last_name": "Lovelace"
        })
    }

    #[actix_rt::test]
    async fn test_signup_returns_tokens_then_conflicts() {
        let state = TestState::new("http://localhost");
        let app = test::init_service(test_app(&state)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(signup_body("ada@test.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let tokens: TokenResponse = test::read_body_json(resp).await;
        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(signup_body("ada@test.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "User already exists");
    }

    #[actix_rt::test]
    async fn test_signup_validation_errors_are_unprocessable() {
        let state = TestState::new("http://localhost");
        let app = test::init_service(test_app(&state)).await;

        let mut body = signup_body("invalid_email");
        body["password"] = json!("abc");
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({"login": "ada@test.com"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[actix_rt::test]
    async fn test_login_success_and_failures() {
        let state = TestState::new("http://localhost");
        let app = test::init_service(test_app(&state)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(signup_body("ada@test.com"))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"login": "ada@test.com", "password": "Passw0rd"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let mut messages = Vec::new();
        for (login, password) in [("ada@test.com", "wrong"), ("bob@test.com", "Passw0rd")] {
            let req = test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({"login": login, "password": password}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: Value = test::read_body_json(resp).await;
            messages.push(body["error"]["message"].clone());
        }
        assert_eq!(messages[0], "Incorrect username or password");
        assert_eq!(messages[0], messages[1]);
    }
}
