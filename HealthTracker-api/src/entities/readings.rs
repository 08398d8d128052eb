use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use health_tracker_domain::entities::{RawReadingFields, ReadingInput, FORM_TIMESTAMP_FORMAT};
use health_tracker_domain::import::ImportReport;
use health_tracker_domain::services::ReadingServiceError;

/// Body of an add or edit request: typed JSON, or the string fields of an entry form
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ReadingPayload {
    Typed(ReadingInput),
    Form(RawReadingFields),
}

impl ReadingPayload {
    /// Form fields are coerced with the same rules as imported rows
    pub fn into_input(self) -> Result<ReadingInput, ReadingServiceError> {
        match self {
            ReadingPayload::Typed(input) => Ok(input),
            ReadingPayload::Form(fields) => Ok(fields.coerce(FORM_TIMESTAMP_FORMAT)?),
        }
    }
}

/// Query parameters for listing readings
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListQueryParams {
    /// Earliest timestamp to include, `YYYY-MM-DDTHH:MM:SS`
    pub start_date: Option<String>,

    /// Latest timestamp to include, `YYYY-MM-DDTHH:MM:SS`
    pub end_date: Option<String>,

    /// Maximum number of results (default: 100, max: 1000)
    pub limit: Option<usize>,

    /// Pagination offset (default: 0)
    pub offset: Option<usize>,

    /// Sort direction (asc/desc, default: desc)
    pub sort: Option<String>,
}

/// Query parameters for reading insights
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct InsightsQueryParams {
    /// Analysis period in days; every reading is used when absent
    pub timeframe: Option<u32>,
}

/// Query parameters for a bulk import; the request body is the file content
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ImportQueryParams {
    /// `delimited`, `csv` or `records` (default: `delimited`)
    pub format: Option<String>,

    /// Field separator for delimited formats; `\t` or `tab` for tab
    pub delimiter: Option<String>,

    /// strftime-style timestamp pattern
    pub date_format: Option<String>,
}

/// Outcome of a bulk import
#[derive(Debug, Serialize, ToSchema)]
pub struct ImportResponse {
    #[serde(flatten)]
    pub report: ImportReport,

    /// The first issues in source order, with a count of the rest
    pub summary: Vec<String>,
}
