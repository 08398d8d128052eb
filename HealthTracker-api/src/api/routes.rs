use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::api::handlers::{health, imports, persons, readings};
use crate::api::AppState;
use crate::openapi::configure_swagger_routes;

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    // Specific reading routes before parametrized ones
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/persons", get(persons::list_persons).post(persons::register_person))
        .route("/persons/:owner_id", get(persons::get_person))
        .route("/persons/:owner_id/readings/chart", get(readings::get_reading_chart))
        .route("/persons/:owner_id/readings/insights", get(readings::get_reading_insights))
        .route("/persons/:owner_id/readings/import", post(imports::import_readings))
        .route(
            "/persons/:owner_id/readings",
            get(readings::list_readings).post(readings::create_reading),
        )
        .route(
            "/persons/:owner_id/readings/:id",
            get(readings::get_reading)
                .put(readings::update_reading)
                .delete(readings::delete_reading),
        );

    debug!("API routes configured");

    health::initialize_server_start_time();

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Configure the Swagger UI using the helper function
    add_swagger_ui(app)
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    app.merge(configure_swagger_routes())
}
