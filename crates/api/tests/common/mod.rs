#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use usercore_api::{routes, AppState};
use usercore_auth::{
    password::MIN_COST, AuthService, JwtConfig, JwtService, ManualClock, PasswordHasher,
    UserService,
};
use usercore_database::{
    DatabaseError, HealthCheck, MemoryCredentialStore, MemorySessionStore,
};

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Database stand-in whose liveness the test controls
#[derive(Default)]
pub struct FakeDatabase {
    down: AtomicBool,
}

impl FakeDatabase {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthCheck for FakeDatabase {
    async fn ping(&self) -> usercore_database::Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(DatabaseError::Other("connection refused".to_string()));
        }
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryCredentialStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub clock: Arc<ManualClock>,
    pub database: Arc<FakeDatabase>,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(MemoryCredentialStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let clock = Arc::new(ManualClock::default());
        let database = Arc::new(FakeDatabase::default());

        let jwt = JwtService::new(JwtConfig::new(SECRET), clock.clone()).unwrap();
        let auth_service = AuthService::new(
            users.clone(),
            sessions.clone(),
            jwt,
            PasswordHasher::new(MIN_COST).unwrap(),
            clock.clone(),
        )
        .unwrap();
        let user_service = UserService::new(users.clone(), sessions.clone());

        let router = routes::create_router(Arc::new(AppState {
            auth_service,
            user_service,
            health: database.clone(),
        }));

        Self {
            router,
            users,
            sessions,
            clock,
            database,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(uri, body)).await
    }

    pub async fn register(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_json(
            "/api/auth/register",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_json(
            "/api/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> (StatusCode, Value) {
        self.post_json(
            "/api/auth/refresh",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    /// Register and log in, returning the access token
    pub async fn signed_in(&self, email: &str) -> String {
        let (status, _) = self.register(email, "password123").await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(email, "password123").await;
        assert_eq!(status, StatusCode::OK);
        str_field(&body, "access_token")
    }

    pub async fn authorized(
        &self,
        method: Method,
        uri: &str,
        access_token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token));

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.send(request.unwrap()).await
    }
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "IntegrationTest/1.0")
        .header("x-forwarded-for", "198.51.100.23")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn str_field(body: &Value, field: &str) -> String {
    body[field]
        .as_str()
        .unwrap_or_else(|| panic!("missing field {} in {}", field, body))
        .to_string()
}
