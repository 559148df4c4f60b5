use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use covid_insights::config::DEFAULT_VALUE_COLUMN;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// GET /eda/mobility
///
/// Monthly county cases joined with monthly state mobility.
pub async fn mobility(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let result = state.insights.mobility().await?;
    Ok(Json(json!(result)))
}

#[derive(Deserialize)]
pub struct CorrelationParams {
    pub value_col: Option<String>,
}

/// GET /eda/correlation?value_col=CASES
///
/// Per-factor coefficients against monthly totals plus the recent-months table.
pub async fn correlation(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CorrelationParams>,
) -> Result<Json<Value>, AppError> {
    let value_col = params
        .value_col
        .unwrap_or_else(|| DEFAULT_VALUE_COLUMN.to_string());
    let result = state.insights.correlation(&value_col).await?;
    Ok(Json(json!(result)))
}
