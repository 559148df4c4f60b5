/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Dispatches blocking warehouse work to the thread pool and owns the
    /// result caches shared by every request.
    pub insights: covid_insights::AsyncCovidInsights,
}
