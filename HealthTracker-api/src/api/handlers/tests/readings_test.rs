use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use super::TestApp;

fn reading(timestamp: &str, systolic: i32, diastolic: i32) -> Value {
    json!({
        "timestamp": timestamp,
        "systolic": systolic,
        "diastolic": diastolic,
        "heart_rate": 70,
        "tags": "morning"
    })
}

async fn add(app: &TestApp, owner: i64, body: Value) -> (StatusCode, Value) {
    app.request(Method::POST, &format!("/api/v1/persons/{}/readings", owner), Some(body))
        .await
}

#[tokio::test]
async fn test_create_and_fetch_reading() {
    let app = TestApp::new();
    let owner = app.register("Ana").await;

    let (status, created) = add(&app, owner, reading("2024-01-01T08:00:00", 120, 80)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["owner_id"], owner);
    assert_eq!(created["tags"], "morning");

    let uri = format!("/api/v1/persons/{}/readings/{}", owner, created["id"]);
    let (status, fetched) = app.request(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_form_fields_are_coerced_like_imports() {
    let app = TestApp::new();
    let owner = app.register("Ana").await;

    let form = json!({
        "timestamp": "2024-03-01T07:45",
        "systolic": "127.8",
        "diastolic": "83",
        "heart_rate": "65",
        "tags": "  "
    });
    let (status, created) = add(&app, owner, form).await;

    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["systolic"], 127);
    assert_eq!(created["timestamp"], "2024-03-01T07:45:00");
    assert_eq!(created["tags"], Value::Null);
}

#[tokio::test]
async fn test_invalid_vitals_are_rejected_with_reason() {
    let app = TestApp::new();
    let owner = app.register("Ana").await;

    let (status, body) = add(&app, owner, reading("2024-01-01T08:00:00", 90, 80)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid systolic value: 90. Must be between 100-200.");

    let (status, body) = add(&app, owner, reading("2024-01-01T08:00:00", 120, 125)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Systolic (120) must be greater than diastolic (125).");

    assert!(app.repository.stored_for(owner).is_empty());
}

#[tokio::test]
async fn test_duplicate_timestamp_is_a_conflict() {
    let app = TestApp::new();
    let owner = app.register("Ana").await;

    add(&app, owner, reading("2024-01-01T08:00:00", 120, 80)).await;
    let (status, body) = add(&app, owner, reading("2024-01-01T08:00:00", 130, 85)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "A record with this date and time already exists.");
    assert_eq!(app.repository.stored_for(owner).len(), 1);
}

#[tokio::test]
async fn test_edit_onto_existing_timestamp_leaves_reading_unchanged() {
    let app = TestApp::new();
    let owner = app.register("Ana").await;

    let (_, x) = add(&app, owner, reading("2024-01-01T08:00:00", 120, 80)).await;
    add(&app, owner, reading("2024-01-02T08:00:00", 130, 85)).await;

    let uri = format!("/api/v1/persons/{}/readings/{}", owner, x["id"]);
    let (status, _) = app
        .request(Method::PUT, &uri, Some(reading("2024-01-02T08:00:00", 150, 90)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, unchanged) = app.request(Method::GET, &uri, None).await;
    assert_eq!(unchanged, x);

    let (status, updated) = app
        .request(Method::PUT, &uri, Some(reading("2024-01-01T08:00:00", 150, 90)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["systolic"], 150);
}

#[tokio::test]
async fn test_readings_of_other_owners_are_not_visible() {
    let app = TestApp::new();
    let ana = app.register("Ana").await;
    let ben = app.register("Ben").await;
    let (_, created) = add(&app, ana, reading("2024-01-01T08:00:00", 120, 80)).await;

    let uri = format!("/api/v1/persons/{}/readings/{}", ben, created["id"]);
    let (status, body) = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Entry not found");

    let uri = format!("/api/v1/persons/{}/readings/{}", ana, created["id"]);
    let (status, _) = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_owner_cannot_add() {
    let app = TestApp::new();
    let (status, _) = add(&app, 9, reading("2024-01-01T08:00:00", 120, 80)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.repository.store_calls(), 0);
}

#[tokio::test]
async fn test_list_chart_and_insights() {
    let app = TestApp::new();
    let owner = app.register("Ana").await;

    let (status, body) = app
        .request(Method::GET, &format!("/api/v1/persons/{}/readings/insights", owner), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "insufficient_data");

    for (day, systolic) in [(1, 120), (2, 140), (3, 130)] {
        add(&app, owner, reading(&format!("2024-01-0{}T08:00:00", day), systolic, 80)).await;
    }

    let (status, page) = app
        .request(
            Method::GET,
            &format!("/api/v1/persons/{}/readings?limit=2&start_date=2024-01-02", owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_count"], 2);
    assert_eq!(page["data"][0]["systolic"], 130);

    let (_, chart) = app
        .request(Method::GET, &format!("/api/v1/persons/{}/readings/chart", owner), None)
        .await;
    let chart = chart.as_array().unwrap();
    assert_eq!(chart.len(), 3);
    assert_eq!(chart[0]["x"], "2024-01-01 08:00:00");

    let (status, insights) = app
        .request(Method::GET, &format!("/api/v1/persons/{}/readings/insights", owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(insights["avg_systolic"], 130.0);
    assert_eq!(insights["category"], "Hypertension1");

    let (status, _) = app
        .request(Method::GET, &format!("/api/v1/persons/{}/readings?sort=sideways", owner), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
