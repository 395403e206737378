#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use harmolyze_api::auth::jwt::{generate_access_token, JwtConfig};
use harmolyze_api::auth::password::hash_password;
use harmolyze_api::config::ServerConfig;
use harmolyze_api::router::build_app_router;
use harmolyze_api::state::AppState;
use harmolyze_core::roles::{ROLE_ADMIN, ROLE_USER};
use harmolyze_core::scoring::calculate_points;
use harmolyze_core::types::DbId;
use harmolyze_db::models::tune::{CreateTune, Tune};
use harmolyze_db::models::user::{CreateUser, User};
use harmolyze_db::repositories::{TuneRepo, UserRepo};

pub const ADMIN_ROLE_ID: DbId = 1;
pub const USER_ROLE_ID: DbId = 2;

pub const TEST_PASSWORD: &str = "geheim123";

pub const SIGNIN_PATH: &str = "/auth/signin";

/// Build a test `ServerConfig` with safe defaults.
///
/// `avatar_dir` points at a directory that does not exist unless a test
/// overrides it, so the avatar list is empty.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        avatar_dir: "target/test-avatars-missing".to_string(),
        signin_path: SIGNIN_PATH.to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
            refresh_token_expiry_days: 30,
        },
    }
}

pub fn test_state(pool: PgPool) -> AppState {
    AppState::new(pool, test_config())
}

/// Full application router, identical to production, over `state`.
pub fn build_app(state: AppState) -> Router {
    let config = state.config.as_ref().clone();
    build_app_router(state, &config)
}

pub fn build_test_app(pool: PgPool) -> Router {
    build_app(test_state(pool))
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a user directly in the database. The password is [`TEST_PASSWORD`].
pub async fn create_test_user(pool: &PgPool, name: &str, role_id: DbId) -> User {
    let input = CreateUser {
        username: name.to_string(),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        image: None,
        role_id,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Access token for `user`, signed with the test secret.
pub fn token_for(user: &User) -> String {
    let role = if user.role_id == ADMIN_ROLE_ID {
        ROLE_ADMIN
    } else {
        ROLE_USER
    };
    generate_access_token(user.id, &user.username, role, &test_config().jwt)
        .expect("token generation should succeed")
}

pub async fn create_test_tune(pool: &PgPool, created_by: DbId, abc: &str) -> Tune {
    let input = CreateTune {
        title: "Test".to_string(),
        abc: abc.to_string(),
        difficulty: 1,
        points: calculate_points(abc) as i32,
        created_by,
    };
    TuneRepo::create(pool, &input)
        .await
        .expect("tune creation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, None, Some(token)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::POST, uri, Some(body), Some(token)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::PUT, uri, Some(body), Some(token)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, None, Some(token)).await
}

pub async fn delete_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::DELETE, uri, Some(body), Some(token)).await
}

/// Read the full response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
