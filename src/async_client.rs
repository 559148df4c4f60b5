//! Async wrapper around [`CovidInsights`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every operation on the blocking thread pool via
//! [`tokio::task::spawn_blocking`] so warehouse queries and dataset
//! downloads never stall the event loop.
//!
//! # Example
//!
//! ```no_run
//! use covid_insights::{AggregationSpec, AsyncCovidInsights, Settings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let insights = AsyncCovidInsights::new(Settings::from_env()).await.unwrap();
//!
//!     let result = insights
//!         .aggregate(AggregationSpec::new("DATE", "CASES"))
//!         .await
//!         .unwrap();
//!
//!     // Any sync method is reachable through `run`.
//!     let columns = insights.run(|s| s.columns()).await.unwrap();
//! }
//! ```

use std::sync::{Arc, Mutex};

use crate::error::{InsightsError, Result};
use crate::models::{
    AggregationSpec, Annotation, Cached, ForecastPoint, MonthlyCorrelation, SeriesSummary,
    TimeSeriesRow,
};
use crate::normalize::JsonRow;
use crate::{CovidInsights, CovidInsightsBuilder, Settings};

/// Async wrapper around [`CovidInsights`].
///
/// The inner service is guarded by a [`Mutex`] since its connection keeps
/// view state in a `RefCell`. Cloning is cheap and shares the same service,
/// including its result caches.
#[derive(Clone)]
pub struct AsyncCovidInsights {
    inner: Arc<Mutex<CovidInsights>>,
}

impl AsyncCovidInsights {
    /// Build the service from `settings` on the blocking thread pool.
    pub async fn new(settings: Settings) -> Result<Self> {
        Self::from_builder(CovidInsights::builder().settings(settings)).await
    }

    /// Finish a configured sync builder on the blocking thread pool.
    pub async fn from_builder(builder: CovidInsightsBuilder) -> Result<Self> {
        let insights = tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(join_error)??;
        Ok(Self::wrap(insights))
    }

    /// Wrap an already constructed service.
    pub fn wrap(insights: CovidInsights) -> Self {
        Self {
            inner: Arc::new(Mutex::new(insights)),
        }
    }

    /// Run a sync operation on the blocking thread pool.
    ///
    /// ```no_run
    /// # use covid_insights::AsyncCovidInsights;
    /// # async fn example(insights: AsyncCovidInsights) -> covid_insights::Result<()> {
    /// let version = insights.run(|s| s.engine_version()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&CovidInsights) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            // A panicking task never leaves a half-written cache entry behind.
            let guard = inner.lock().unwrap_or_else(|e| e.into_inner());
            f(&guard)
        })
        .await
        .map_err(join_error)?
    }

    pub async fn aggregate(&self, spec: AggregationSpec) -> Result<Cached<Vec<TimeSeriesRow>>> {
        self.run(move |s| s.aggregate(&spec)).await
    }

    pub async fn mobility(&self) -> Result<Cached<Vec<JsonRow>>> {
        self.run(|s| s.mobility()).await
    }

    pub async fn summary(&self) -> Result<Option<SeriesSummary>> {
        self.run(|s| s.summary()).await
    }

    pub async fn forecast(&self, periods: usize) -> Result<Vec<ForecastPoint>> {
        self.run(move |s| s.forecast(periods)).await
    }

    pub async fn correlation(&self, value_column: &str) -> Result<MonthlyCorrelation> {
        let value_column = value_column.to_string();
        self.run(move |s| s.correlation(&value_column)).await
    }

    pub async fn add_annotation(
        &self,
        geo: &str,
        text: &str,
        author: Option<&str>,
    ) -> Result<Annotation> {
        let (geo, text) = (geo.to_string(), text.to_string());
        let author = author.map(str::to_string);
        self.run(move |s| s.annotations().add(&geo, &text, author.as_deref()))
            .await
    }

    pub async fn annotations(&self, geo: Option<&str>) -> Result<Vec<Annotation>> {
        let geo = geo.map(str::to_string);
        self.run(move |s| s.annotations().list(geo.as_deref())).await
    }

    /// Execute a raw SQL query asynchronously.
    pub async fn sql(&self, query: &str, params: &[String]) -> Result<Vec<JsonRow>> {
        let query = query.to_string();
        let params = params.to_vec();
        self.run(move |s| s.sql(&query, &params)).await
    }
}

fn join_error(e: tokio::task::JoinError) -> InsightsError {
    InsightsError::TaskFailed(e.to_string())
}
