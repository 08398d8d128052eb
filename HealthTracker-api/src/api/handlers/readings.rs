use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, instrument};

use health_tracker_domain::entities::{ChartPoint, Reading, ReadingInsights, ReadingQuery};

use crate::api::AppState;
use crate::entities::{ErrorResponse, InsightsQueryParams, ListQueryParams, ReadingPage, ReadingPayload};

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = 1000;

/// Accepts `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` or a bare date (midnight)
fn parse_query_timestamp(name: &str, raw: &str) -> Result<NaiveDateTime, ErrorResponse> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(raw, pattern).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
        .ok_or_else(|| ErrorResponse::bad_request(format!("Invalid {}: '{}'", name, raw)))
}

impl TryFrom<ListQueryParams> for ReadingQuery {
    type Error = ErrorResponse;

    fn try_from(params: ListQueryParams) -> Result<Self, Self::Error> {
        let sort_desc = match params.sort.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("desc") => true,
            Some("asc") => false,
            Some(other) => {
                return Err(ErrorResponse::bad_request(format!(
                    "Invalid sort direction: '{}'. Expected asc or desc",
                    other
                )))
            }
        };

        Ok(ReadingQuery {
            start: params
                .start_date
                .as_deref()
                .map(|raw| parse_query_timestamp("start_date", raw))
                .transpose()?,
            end: params
                .end_date
                .as_deref()
                .map(|raw| parse_query_timestamp("end_date", raw))
                .transpose()?,
            sort_desc,
            limit: Some(params.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)),
            offset: params.offset,
        })
    }
}

/// List an owner's readings, newest first by default
#[utoipa::path(
    get,
    path = "/api/v1/persons/{owner_id}/readings",
    params(("owner_id" = i64, Path, description = "Person id"), ListQueryParams),
    responses(
        (status = 200, description = "Page of readings", body = ReadingPage),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(state, params))]
pub async fn list_readings(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
    Query(params): Query<ListQueryParams>,
) -> Result<impl IntoResponse, ErrorResponse> {
    state.persons.get(owner_id).await?;
    let query = ReadingQuery::try_from(params)?;
    let offset = query.offset.unwrap_or(0);

    let (readings, total) = state.readings.list_readings(owner_id, query).await?;
    info!("Returning {} of {} readings for owner {}", readings.len(), total, owner_id);
    Ok(Json(ReadingPage::new(readings, total, offset)))
}

/// Add a reading
#[utoipa::path(
    post,
    path = "/api/v1/persons/{owner_id}/readings",
    params(("owner_id" = i64, Path, description = "Person id")),
    request_body = ReadingPayload,
    responses(
        (status = 201, description = "Reading created", body = Reading),
        (status = 400, description = "Invalid reading", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse),
        (status = 409, description = "A reading already exists at this timestamp", body = ErrorResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(state, payload))]
pub async fn create_reading(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
    Json(payload): Json<ReadingPayload>,
) -> Result<impl IntoResponse, ErrorResponse> {
    state.persons.get(owner_id).await?;
    let input = payload.into_input()?;
    let reading = state.readings.add_reading(input, owner_id).await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

/// Get one reading
#[utoipa::path(
    get,
    path = "/api/v1/persons/{owner_id}/readings/{id}",
    params(
        ("owner_id" = i64, Path, description = "Person id"),
        ("id" = i64, Path, description = "Reading id")
    ),
    responses(
        (status = 200, description = "Reading found", body = Reading),
        (status = 404, description = "Reading not found", body = ErrorResponse),
    ),
    tag = "readings"
)]
pub async fn get_reading(
    State(state): State<AppState>,
    Path((owner_id, id)): Path<(i64, i64)>,
) -> Result<Json<Reading>, ErrorResponse> {
    Ok(Json(state.readings.get_reading(id, owner_id).await?))
}

/// Replace a reading's fields
#[utoipa::path(
    put,
    path = "/api/v1/persons/{owner_id}/readings/{id}",
    params(
        ("owner_id" = i64, Path, description = "Person id"),
        ("id" = i64, Path, description = "Reading id")
    ),
    request_body = ReadingPayload,
    responses(
        (status = 200, description = "Reading updated", body = Reading),
        (status = 400, description = "Invalid reading", body = ErrorResponse),
        (status = 404, description = "Reading not found", body = ErrorResponse),
        (status = 409, description = "Another reading exists at this timestamp", body = ErrorResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(state, payload))]
pub async fn update_reading(
    State(state): State<AppState>,
    Path((owner_id, id)): Path<(i64, i64)>,
    Json(payload): Json<ReadingPayload>,
) -> Result<Json<Reading>, ErrorResponse> {
    let input = payload.into_input()?;
    Ok(Json(state.readings.update_reading(id, input, owner_id).await?))
}

/// Delete a reading
#[utoipa::path(
    delete,
    path = "/api/v1/persons/{owner_id}/readings/{id}",
    params(
        ("owner_id" = i64, Path, description = "Person id"),
        ("id" = i64, Path, description = "Reading id")
    ),
    responses(
        (status = 204, description = "Reading deleted"),
        (status = 404, description = "Reading not found", body = ErrorResponse),
    ),
    tag = "readings"
)]
#[instrument(skip(state))]
pub async fn delete_reading(
    State(state): State<AppState>,
    Path((owner_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode, ErrorResponse> {
    state.readings.delete_reading(id, owner_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Chart data: every reading of the owner, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/persons/{owner_id}/readings/chart",
    params(("owner_id" = i64, Path, description = "Person id")),
    responses(
        (status = 200, description = "Chart points", body = [ChartPoint]),
        (status = 404, description = "Person not found", body = ErrorResponse),
    ),
    tag = "readings"
)]
pub async fn get_reading_chart(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
) -> Result<Json<Vec<ChartPoint>>, ErrorResponse> {
    state.persons.get(owner_id).await?;
    Ok(Json(state.readings.chart_series(owner_id).await?))
}

/// Averages, extremes and blood pressure category
#[utoipa::path(
    get,
    path = "/api/v1/persons/{owner_id}/readings/insights",
    params(("owner_id" = i64, Path, description = "Person id"), InsightsQueryParams),
    responses(
        (status = 200, description = "Reading insights", body = ReadingInsights),
        (status = 404, description = "Person not found", body = ErrorResponse),
        (status = 422, description = "No readings in the period", body = ErrorResponse),
    ),
    tag = "readings"
)]
pub async fn get_reading_insights(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
    Query(params): Query<InsightsQueryParams>,
) -> Result<Json<ReadingInsights>, ErrorResponse> {
    state.persons.get(owner_id).await?;
    Ok(Json(state.readings.summarize(owner_id, params.timeframe).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timestamps() {
        let parsed = parse_query_timestamp("start_date", "2024-01-01T08:00:00").unwrap();
        assert_eq!(parsed.to_string(), "2024-01-01 08:00:00");
        let parsed = parse_query_timestamp("start_date", "2024-01-01").unwrap();
        assert_eq!(parsed.to_string(), "2024-01-01 00:00:00");
        assert!(parse_query_timestamp("start_date", "yesterday").is_err());
    }

    #[test]
    fn test_list_params_defaults() {
        let query = ReadingQuery::try_from(ListQueryParams::default()).unwrap();
        assert!(query.sort_desc);
        assert_eq!(query.limit, Some(DEFAULT_PAGE_SIZE));

        let query = ReadingQuery::try_from(ListQueryParams {
            limit: Some(5000),
            sort: Some("ASC".to_string()),
            ..ListQueryParams::default()
        })
        .unwrap();
        assert!(!query.sort_desc);
        assert_eq!(query.limit, Some(MAX_PAGE_SIZE));
    }
}
