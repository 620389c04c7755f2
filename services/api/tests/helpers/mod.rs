// Shared fixtures for the HTTP integration tests. Each test file pulls this in
// with `mod helpers;` and uses a different subset, hence the dead_code allows.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_lib::{
    adapters::{FakeRecipeAdapter, InMemoryDb},
    config::{AiProvider, Config},
    web::{router, AppState},
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "Password123";

pub fn test_config() -> Config {
    Config {
        bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: "memory://".to_string(),
        log_level: tracing::Level::WARN,
        jwt_secret: JWT_SECRET.to_string(),
        token_ttl: Duration::from_secs(24 * 60 * 60),
        cors_origin: "http://localhost:3000".to_string(),
        ai_provider: AiProvider::Fake,
        google_ai_model: "gemini-1.5-pro".to_string(),
        gemini_api_key: None,
        google_cloud_project: None,
        google_cloud_location: "us-west1".to_string(),
        google_access_token: None,
        openai_api_key: None,
        openai_model: "gpt-4o-mini".to_string(),
        ai_timeout: Duration::from_secs(5),
        ai_max_attempts: 1,
    }
}

/// The real router over an in-memory database and a scripted generator.
pub struct TestApp {
    pub app: Router,
    pub db: Arc<InMemoryDb>,
    pub generator: Arc<FakeRecipeAdapter>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_generator(FakeRecipeAdapter::default())
    }

    pub fn with_generator(generator: FakeRecipeAdapter) -> Self {
        let db = Arc::new(InMemoryDb::new());
        let generator = Arc::new(generator);
        let state = AppState::new(db.clone(), generator.clone(), Arc::new(test_config()));
        Self {
            app: router(Arc::new(state)),
            db,
            generator,
        }
    }

    pub async fn send(&self, request: TestRequest) -> TestResponse {
        request.send(self.app.clone()).await
    }

    /// Registers `email` and returns its bearer token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .send(TestRequest::post("/api/auth/register").json(&json!({
                "email": email,
                "password": PASSWORD,
            })))
            .await
            .assert_status(StatusCode::CREATED);
        response.json()["token"]
            .as_str()
            .expect("register response carries a token")
            .to_string()
    }

    /// Saves a minimal recipe and returns the response body.
    pub async fn save_recipe(&self, token: &str, title: &str) -> Value {
        self.send(
            TestRequest::post("/api/recipes")
                .bearer(token)
                .json(&recipe_body(title)),
        )
        .await
        .assert_status(StatusCode::CREATED)
        .json()
    }
}

pub fn recipe_body(title: &str) -> Value {
    json!({
        "title": title,
        "ingredients": ["2 cups flour", "1 cup milk", "salt to taste"],
        "instructions": ["Whisk everything together.", "Cook on a hot griddle."],
        "prepTime": "5 minutes",
        "cookTime": "10 minutes",
        "servings": 2,
        "difficulty": "easy",
        "tags": ["quick"],
        "categories": ["Breakfast"]
    })
}

/// Helper to build and execute HTTP requests against the router.
pub struct TestRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl TestRequest {
    fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn patch(uri: &str) -> Self {
        Self::new(Method::PATCH, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header(header::AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }

    pub fn json<T: Serialize>(mut self, data: &T) -> Self {
        self.body = Some(serde_json::to_string(data).expect("Failed to serialize JSON"));
        self.header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    pub async fn send(self, app: Router) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }

        let request = builder
            .body(Body::from(self.body.unwrap_or_default()))
            .expect("Failed to build request");
        let response = app
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body")
            .to_vec();
        TestResponse { status, body }
    }
}

pub struct TestResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Failed to deserialize JSON response")
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// The `error` message of a failure body.
    pub fn error(&self) -> String {
        self.json()["error"].as_str().unwrap_or_default().to_string()
    }

    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}
