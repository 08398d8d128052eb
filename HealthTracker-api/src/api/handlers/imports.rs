use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, instrument};

use health_tracker_domain::config::parse_delimiter;
use health_tracker_domain::import::ImportOptions;

use crate::api::AppState;
use crate::entities::{ErrorResponse, ImportQueryParams, ImportResponse};

const DEFAULT_IMPORT_FORMAT: &str = "delimited";

/// Bulk import readings for an owner.
///
/// Rows are accepted or rejected independently. A fatal problem (missing
/// header fields, undecodable content, unknown format, storage failure)
/// stores nothing and is answered with 422 and the report.
#[utoipa::path(
    post,
    path = "/api/v1/persons/{owner_id}/readings/import",
    params(("owner_id" = i64, Path, description = "Person id"), ImportQueryParams),
    request_body(content = String, description = "File content", content_type = "text/plain"),
    responses(
        (status = 200, description = "Import finished", body = ImportResponse),
        (status = 400, description = "Invalid import options", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse),
        (status = 422, description = "Import aborted; nothing stored", body = ImportResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(state, params, body), fields(bytes = body.len()))]
pub async fn import_readings(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
    Query(params): Query<ImportQueryParams>,
    body: Bytes,
) -> Result<impl IntoResponse, ErrorResponse> {
    state.persons.get(owner_id).await?;

    let mut options = ImportOptions::from_config(&state.import_config, owner_id);
    if let Some(raw) = params.delimiter.as_deref() {
        options.delimiter = parse_delimiter(raw).map_err(|e| ErrorResponse::bad_request(e.to_string()))?;
    }
    if let Some(pattern) = params.date_format.filter(|p| !p.trim().is_empty()) {
        options.date_pattern = pattern;
    }
    let format = params.format.as_deref().unwrap_or(DEFAULT_IMPORT_FORMAT);

    let report = state.imports.import(&body, format, &options).await;
    info!(
        import_id = %report.import_id,
        accepted = report.accepted,
        rejected = report.rejected,
        duplicate = report.duplicate,
        "Import request for owner {} done",
        owner_id
    );

    let status = if report.is_fatal() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    let summary = report.summary(state.import_config.max_reported_errors);
    Ok((status, Json(ImportResponse { report, summary })))
}
