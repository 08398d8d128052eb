mod persons_test;
mod readings_test;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use health_tracker_domain::testing::MockHealthReadingRepository;
use health_tracker_data::repository::InMemoryPersonRepository;
use health_tracker_domain::config::ImportConfig;

use crate::api::{create_application, AppState};

/// Router over a counting mock reading repository
pub(crate) struct TestApp {
    pub router: Router,
    pub repository: MockHealthReadingRepository,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_repository(MockHealthReadingRepository::new())
    }

    pub fn with_repository(repository: MockHealthReadingRepository) -> Self {
        let state = AppState::from_repositories(
            Arc::new(repository.clone()),
            Arc::new(InMemoryPersonRepository::new()),
            ImportConfig::default(),
            None,
        );
        Self {
            router: create_application(state),
            repository,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        self.send(request).await
    }

    pub async fn upload(&self, uri: &str, content: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(content.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
        };
        (status, body)
    }

    /// Register a person and return their id
    pub async fn register(&self, name: &str) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/persons",
                Some(json!({ "name": name, "age": 45, "gender": "F" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }
}
