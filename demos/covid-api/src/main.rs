mod error;
mod routes;
mod state;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use covid_insights::{AsyncCovidInsights, Settings};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use state::AppState;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from_env();
    tracing::info!(config = %settings.summary(), "initializing covid insights");
    let insights = AsyncCovidInsights::new(settings)
        .await
        .expect("Failed to initialize covid insights");

    let state = Arc::new(AppState { insights });

    let app = Router::new()
        .route("/health", get(routes::warehouse::health))
        .route("/warehouse/ping", get(routes::warehouse::ping))
        .route("/warehouse/config", get(routes::warehouse::config))
        .route("/covid/summary", get(routes::covid::summary))
        .route("/covid/columns", get(routes::covid::columns))
        .route("/covid/aggregate", get(routes::covid::aggregate))
        .route("/analytics/summary", get(routes::analytics::summary))
        .route("/analytics/forecast", get(routes::analytics::forecast))
        .route(
            "/annotations",
            get(routes::annotations::list).post(routes::annotations::add),
        )
        .route("/eda/mobility", get(routes::eda::mobility))
        .route("/eda/correlation", get(routes::eda::correlation))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    tracing::info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
