mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{PASSWORD, login, register, send, spawn_app, spawn_app_with, test_config};
use kitchen_nerd::api::AppState;
use kitchen_nerd::db::User;
use kitchen_nerd::domain::UserId;
use kitchen_nerd::models::session::{SessionToken, TOKEN_LENGTH};
use kitchen_nerd::services::{Profile, UserError, UserService};
use serde_json::json;
use std::sync::Arc;

/// User service whose store has lost every account.
struct NoUsers;

#[async_trait::async_trait]
impl UserService for NoUsers {
    async fn register(&self, _name: &str, _email: &str, _password: &str) -> Result<User, UserError> {
        Err(UserError::Persistence("users table unavailable".to_string()))
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<SessionToken, UserError> {
        Err(UserError::WrongCredentials)
    }

    async fn get(&self, _id: UserId) -> Result<User, UserError> {
        Err(UserError::Persistence("users table unavailable".to_string()))
    }

    async fn get_profile(&self, _id: UserId) -> Result<Profile, UserError> {
        Err(UserError::NotFound)
    }

    async fn promote(&self, _email: &str) -> Result<(), UserError> {
        Err(UserError::NotFound)
    }
}

#[tokio::test]
async fn test_register_login_and_access_profile() {
    let (app, _state) = spawn_app().await;

    let user = register(&app, "Ann", "Ann@Example.com").await;
    assert_eq!(user["email"], "ann@example.com");
    assert_eq!(user["status"], "user");
    assert!(user.get("password").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled_2fa"], false);
    assert!(body["expired_at"].is_string());

    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), TOKEN_LENGTH);

    let (status, me) = send(&app, "GET", "/users/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Ann");
    assert_eq!(me["id"], user["id"]);

    let profile_uri = format!("/users/{}", user["id"].as_str().unwrap());
    let (status, profile) = send(&app, "GET", &profile_uri, Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile, json!({ "id": user["id"], "name": "Ann", "status": "user" }));
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let (app, _state) = spawn_app().await;
    register(&app, "Ann", "ann@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "Other Ann",
            "email": "  ANN@example.com ",
            "password": PASSWORD,
            "repeatedPassword": PASSWORD,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "user with such email address already exists");
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let (app, _state) = spawn_app().await;

    let cases = [
        json!({ "username": "Ann", "email": "ann@example.com", "password": "weak", "repeatedPassword": "weak" }),
        json!({ "username": "Ann", "email": "ann@example.com", "password": PASSWORD, "repeatedPassword": "Secret124" }),
        json!({ "username": "Ann", "email": "not-an-email", "password": PASSWORD, "repeatedPassword": PASSWORD }),
        json!({ "username": "", "email": "ann@example.com", "password": PASSWORD, "repeatedPassword": PASSWORD }),
    ];

    for payload in cases {
        let (status, body) = send(&app, "POST", "/auth/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    let (status, body) = send(&app, "POST", "/auth/register", None, Some(json!("garbage"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_wrong_credentials_do_not_reveal_which_part_failed() {
    let (app, _state) = spawn_app().await;
    register(&app, "Ann", "ann@example.com").await;

    let (status_pw, body_pw) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "Wrong1234" })),
    )
    .await;

    let (status_email, body_email) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(status_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(status_email, StatusCode::UNAUTHORIZED);
    assert_eq!(body_pw, body_email);
    assert_eq!(body_pw["error"], "wrong credentials");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (app, state) = spawn_app().await;
    let user = register(&app, "Ann", "ann@example.com").await;
    let user_id: UserId = user["id"].as_str().unwrap().parse().unwrap();

    let stale = SessionToken::new(user_id, Utc::now() - Duration::days(6), Duration::days(5)).unwrap();
    state.store().add_login_session(&stale).await.unwrap();

    let (status, body) = send(&app, "GET", "/users/me", Some(&stale.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token expired");

    let (status, body) = send(&app, "GET", "/users/me", Some("no-such-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token does not exist");
}

#[tokio::test]
async fn test_missing_header_is_rejected_when_auth_required() {
    let (app, _state) = spawn_app().await;

    let (status, body) = send(&app, "GET", "/recipes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing authorization header");

    let (status, _) = send(&app, "GET", "/users/me", Some(""), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_requests_pass_when_auth_optional() {
    let mut config = test_config();
    config.server.require_auth = false;
    let (app, _state) = spawn_app_with(config).await;

    let (status, body) = send(&app, "GET", "/recipes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 0);

    let (status, body) = send(&app, "GET", "/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication required");

    // A header that is present is still checked
    let (status, _) = send(&app, "GET", "/recipes", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_only_current_session() {
    let (app, _state) = spawn_app().await;
    register(&app, "Ann", "ann@example.com").await;

    let first = login(&app, "ann@example.com").await;
    let second = login(&app, "ann@example.com").await;
    assert_ne!(first, second);

    let (status, _) = send(&app, "POST", "/auth/logout", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/users/me", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/users/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_session_listing_and_revocation() {
    let (app, _state) = spawn_app().await;
    register(&app, "Ann", "ann@example.com").await;
    register(&app, "Bob", "bob@example.com").await;

    let current = login(&app, "ann@example.com").await;
    let other = login(&app, "ann@example.com").await;
    let bob = login(&app, "bob@example.com").await;

    let (status, sessions) = send(&app, "GET", "/auth/sessions", Some(&current), None).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = sessions.as_array().unwrap().clone();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions.iter().filter(|s| s["current"] == true).count(), 1);
    for session in &sessions {
        let masked = session["token"].as_str().unwrap();
        assert!(!masked.contains(&current[..TOKEN_LENGTH - 4]));
    }

    let other_id = sessions
        .iter()
        .find(|s| s["current"] == false)
        .and_then(|s| s["id"].as_str())
        .unwrap()
        .to_string();

    // Someone else's session id is not found for bob
    let uri = format!("/auth/sessions/{other_id}");
    let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "DELETE", &uri, Some(&current), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 1);

    let (status, _) = send(&app, "GET", "/users/me", Some(&other), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "DELETE", "/auth/sessions/not-a-uuid", Some(&current), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "DELETE", "/auth/sessions", Some(&current), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 1);

    let (status, _) = send(&app, "GET", "/users/me", Some(&current), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/users/me", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_profile_is_not_found() {
    let (app, _state) = spawn_app().await;
    register(&app, "Ann", "ann@example.com").await;
    let token = login(&app, "ann@example.com").await;

    let uri = format!("/users/{}", UserId::generate());
    let (status, body) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "user not found");
}

#[tokio::test]
async fn test_session_without_loadable_owner_is_internal_error() {
    let (app, state) = spawn_app().await;
    register(&app, "Ann", "ann@example.com").await;
    let token = login(&app, "ann@example.com").await;

    let broken = Arc::new(AppState {
        config: state.config.clone(),
        store: state.store.clone(),
        user_service: Arc::new(NoUsers),
        token_service: Arc::clone(&state.token_service),
        recipe_service: Arc::clone(&state.recipe_service),
        start_time: state.start_time,
        prometheus_handle: None,
    });
    let app = kitchen_nerd::api::router(broken);

    let (status, body) = send(&app, "GET", "/recipes", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "An internal error occurred" }));
}
