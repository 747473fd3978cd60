#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gatehouse::router::init_router;
use gatehouse::state::AppState;
use gatehouse_config::{CorsConfig, JwtConfig, RateLimitConfig};
use gatehouse_core::hash_password;
use gatehouse_db::{MemoryStore, RoleRepository, UserRepository};
use gatehouse_models::users::{NewUser, User, UserStatus};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret-with-enough-length".to_string(),
        ..JwtConfig::default()
    }
}

/// App over an in-memory store with the predefined roles seeded.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_rate_limit(RateLimitConfig::default()).await
}

pub async fn spawn_app_with_rate_limit(rate_limit: RateLimitConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    store.ensure_predefined_roles().await.unwrap();

    let state = AppState::new(
        store.clone(),
        &jwt_config(),
        &rate_limit,
        CorsConfig::default(),
    );

    TestApp {
        router: init_router(state.clone()),
        state,
        store,
    }
}

pub fn strict_rate_limit(limit: usize) -> RateLimitConfig {
    RateLimitConfig::new(limit, Duration::from_secs(60))
}

impl TestApp {
    /// Inserts a user directly, bypassing the API.
    pub async fn seed_user(&self, username: &str, role_code: Option<&str>, status: UserStatus) -> User {
        let role_id = match role_code {
            Some(code) => Some(self.role_id(code).await),
            None => None,
        };

        self.store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                email: format!("{username}@example.com"),
                nickname: username.to_string(),
                role_id,
                status,
            })
            .await
            .unwrap()
    }

    pub async fn role_id(&self, code: &str) -> u64 {
        self.store
            .find_role_by_code(code)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("role {code} not seeded"))
            .id
    }

    /// Logs in through the API and returns the full login body.
    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({ "username": username, "password": password }),
        ))
        .await
    }

    pub async fn access_token(&self, username: &str) -> String {
        let (status, body) = self.login(username, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}
