use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Person endpoints
        crate::api::handlers::persons::register_person,
        crate::api::handlers::persons::list_persons,
        crate::api::handlers::persons::get_person,

        // Reading endpoints
        crate::api::handlers::readings::list_readings,
        crate::api::handlers::readings::create_reading,
        crate::api::handlers::readings::get_reading,
        crate::api::handlers::readings::update_reading,
        crate::api::handlers::readings::delete_reading,
        crate::api::handlers::readings::get_reading_chart,
        crate::api::handlers::readings::get_reading_insights,
        crate::api::handlers::imports::import_readings,
    ),
    components(
        schemas(
            // Domain entities
            health_tracker_domain::entities::Person,
            health_tracker_domain::entities::RegisterPersonRequest,
            health_tracker_domain::entities::Reading,
            health_tracker_domain::entities::ReadingInput,
            health_tracker_domain::entities::RawReadingFields,
            health_tracker_domain::entities::ChartPoint,
            health_tracker_domain::entities::ReadingInsights,
            health_tracker_domain::entities::BloodPressureCategory,
            health_tracker_domain::import::ImportReport,
            health_tracker_domain::import::ImportIssue,

            // API entities
            crate::entities::ErrorResponse,
            crate::entities::ReadingPage,
            crate::entities::ReadingPayload,
            crate::entities::ImportResponse,
            crate::entities::ListQueryParams,
            crate::entities::InsightsQueryParams,
            crate::entities::ImportQueryParams,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentHealthStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "persons", description = "Registration of reading owners"),
        (name = "readings", description = "Blood pressure and heart rate readings, including bulk import")
    ),
    info(
        title = "HealthTracker API",
        version = "0.1.0",
        description = "API for recording, importing and summarising blood pressure readings",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;
