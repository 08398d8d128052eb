use axum::http::{Method, StatusCode};
use serde_json::json;

use super::TestApp;

#[tokio::test]
async fn test_register_list_and_get() {
    let app = TestApp::new();
    let id = app.register("Maria").await;

    let (status, body) = app.request(Method::GET, &format!("/api/v1/persons/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Maria");

    let (status, body) = app.request(Method::GET, "/api/v1/persons", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_validates_payload() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/persons",
            Some(json!({ "name": "Sam", "age": 151, "gender": "non-binary-person" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Age must be between 0 and 150"));
    assert!(message.contains("Gender must be between 1 and 10 characters"));
}

#[tokio::test]
async fn test_unknown_person_is_404() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/api/v1/persons/77", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Person 77 not found");
}
