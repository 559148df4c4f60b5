use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use covid_insights::config::DEFAULT_FORECAST_PERIODS;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// GET /analytics/summary
///
/// Descriptive statistics of the default daily series.
pub async fn summary(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    match state.insights.summary().await? {
        Some(summary) => Ok(Json(json!(summary))),
        None => Ok(Json(json!({ "error": "No data available" }))),
    }
}

#[derive(Deserialize)]
pub struct ForecastParams {
    pub periods: Option<usize>,
}

/// GET /analytics/forecast?periods=7
pub async fn forecast(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastParams>,
) -> Result<Json<Value>, AppError> {
    let periods = params.periods.unwrap_or(DEFAULT_FORECAST_PERIODS);
    let series = state.insights.run(|s| s.analytics_series()).await?;
    if series.iter().all(|row| row.point().is_none()) {
        return Err(AppError::bad_request("No data available"));
    }

    let forecast = covid_insights::analytics::forecast(&series, periods);
    Ok(Json(json!({ "forecast": forecast })))
}
