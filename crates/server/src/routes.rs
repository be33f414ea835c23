//! API route handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cpi_data::{QueryError, SeriesPoint, DATE_COLUMN};
use serde_json::{json, Map, Value};

use crate::AppState;

type Record = Map<String, Value>;

/// Query failure rendered as `{"detail": ...}` with status 404.
pub struct ApiError(QueryError);

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self.0 {
            QueryError::NotFound(_) => "Series ID not found",
            QueryError::InvalidDateRange { .. } => "Invalid date range",
        };
        tracing::debug!(error = %self.0, "query rejected");
        (StatusCode::NOT_FOUND, Json(json!({ "detail": detail }))).into_response()
    }
}

fn point_records(series_id: &str, points: Vec<SeriesPoint>) -> Vec<Record> {
    points
        .into_iter()
        .map(|p| {
            let mut record = Record::new();
            record.insert(DATE_COLUMN.to_string(), json!(p.date.to_string()));
            record.insert(series_id.to_string(), json!(p.value));
            record
        })
        .collect()
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the CPI Data API" }))
}

/// Liveness probe - is the server running?
pub async fn liveness() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Every row, with `null` for missing values.
pub async fn all_rows(State(state): State<AppState>) -> Json<Vec<Record>> {
    let table = &state.table;
    let records = table
        .rows()
        .iter()
        .map(|row| {
            let mut record = Record::new();
            record.insert(DATE_COLUMN.to_string(), json!(row.date.to_string()));
            for (column, value) in table.columns().iter().zip(&row.values) {
                record.insert(column.clone(), json!(value));
            }
            record
        })
        .collect();
    Json(records)
}

/// Non-missing values of one series.
pub async fn series(
    State(state): State<AppState>,
    Path(series_id): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let points = state.table.series(&series_id)?;
    Ok(Json(point_records(&series_id, points)))
}

/// Non-missing values of one series between two ISO dates, inclusive.
pub async fn series_between(
    State(state): State<AppState>,
    Path((series_id, start_date, end_date)): Path<(String, String, String)>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let points = state
        .table
        .series_between(&series_id, &start_date, &end_date)?;
    Ok(Json(point_records(&series_id, points)))
}
