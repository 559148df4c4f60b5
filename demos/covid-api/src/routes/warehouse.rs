use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /warehouse/ping
///
/// Round-trips a query through the warehouse and reports its version.
pub async fn ping(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let version = state.insights.run(|s| s.engine_version()).await?;
    Ok(Json(json!({ "warehouse_version": version })))
}

/// GET /warehouse/config
pub async fn config(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let summary = state.insights.run(|s| Ok(s.config_summary())).await?;
    Ok(Json(summary))
}
