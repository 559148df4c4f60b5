use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use covid_insights::config::{DEFAULT_ROW_LIMIT, DEFAULT_SAMPLE_LIMIT};
use covid_insights::AggregationSpec;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SampleParams {
    pub limit: Option<usize>,
}

/// GET /covid/summary?limit=5
///
/// First rows of the covid table.
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SampleParams>,
) -> Result<Json<Value>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_SAMPLE_LIMIT);
    let rows = state.insights.run(move |s| s.sample(limit)).await?;
    Ok(Json(json!(rows)))
}

/// GET /covid/columns
pub async fn columns(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let columns = state.insights.run(|s| s.columns()).await?;
    Ok(Json(json!(columns)))
}

#[derive(Deserialize)]
pub struct AggregateParams {
    pub date_col: String,
    pub value_col: String,
    pub geo_col: Option<String>,
    pub agg: Option<String>,
    pub limit: Option<usize>,
}

/// GET /covid/aggregate?date_col=DATE&value_col=CASES&geo_col=COUNTY&agg=sum&limit=1000
///
/// Grouped time series, served from the result cache while fresh.
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AggregateParams>,
) -> Result<Json<Value>, AppError> {
    let mut spec = AggregationSpec::new(params.date_col, params.value_col)
        .agg(params.agg.as_deref().unwrap_or("sum"))
        .limit(params.limit.unwrap_or(DEFAULT_ROW_LIMIT));
    if let Some(geo) = params.geo_col {
        spec = spec.geo(geo);
    }

    let result = state.insights.aggregate(spec).await?;
    Ok(Json(json!(result)))
}
