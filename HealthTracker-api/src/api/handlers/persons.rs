use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, instrument};

use health_tracker_domain::entities::{Person, RegisterPersonRequest};

use crate::api::AppState;
use crate::entities::ErrorResponse;

/// Register a person who can own readings
#[utoipa::path(
    post,
    path = "/api/v1/persons",
    request_body = RegisterPersonRequest,
    responses(
        (status = 201, description = "Person registered", body = Person),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "persons"
)]
#[instrument(skip(state, request))]
pub async fn register_person(
    State(state): State<AppState>,
    Json(request): Json<RegisterPersonRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let person = state.persons.register(request).await?;
    info!("Registered person {}", person.id);
    Ok((StatusCode::CREATED, Json(person)))
}

/// List registered persons
#[utoipa::path(
    get,
    path = "/api/v1/persons",
    responses(
        (status = 200, description = "Registered persons", body = [Person]),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "persons"
)]
pub async fn list_persons(State(state): State<AppState>) -> Result<Json<Vec<Person>>, ErrorResponse> {
    Ok(Json(state.persons.list().await?))
}

/// Get a person by id
#[utoipa::path(
    get,
    path = "/api/v1/persons/{owner_id}",
    params(("owner_id" = i64, Path, description = "Person id")),
    responses(
        (status = 200, description = "Person found", body = Person),
        (status = 404, description = "Person not found", body = ErrorResponse),
    ),
    tag = "persons"
)]
pub async fn get_person(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
) -> Result<Json<Person>, ErrorResponse> {
    Ok(Json(state.persons.get(owner_id).await?))
}
