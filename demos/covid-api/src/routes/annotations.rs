use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddParams {
    pub geo: String,
    pub text: String,
    pub author: Option<String>,
}

/// POST /annotations?geo=Alameda&text=...&author=...
pub async fn add(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddParams>,
) -> Result<Json<Value>, AppError> {
    let saved = state
        .insights
        .add_annotation(&params.geo, &params.text, params.author.as_deref())
        .await?;
    Ok(Json(json!(saved)))
}

#[derive(Deserialize)]
pub struct ListParams {
    pub geo: Option<String>,
}

/// GET /annotations?geo=Alameda
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, AppError> {
    let notes = state.insights.annotations(params.geo.as_deref()).await?;
    Ok(Json(json!(notes)))
}
