//! Epidemiological time-series analytics over a DuckDB-backed warehouse.
//!
//! Dataset files (parquet, CSV, NDJSON; local or over HTTP) are registered as
//! DuckDB views and queried in-process. Aggregation results are kept in a
//! short-lived TTL cache, and derived views (trend forecast, monthly mobility
//! correlation) are computed from the aggregated series.
//!
//! # Quick start
//!
//! ```no_run
//! use covid_insights::{AggregationSpec, CovidInsights};
//!
//! let insights = CovidInsights::builder()
//!     .source("covid", "data/case_rates.parquet")
//!     .build()
//!     .unwrap();
//!
//! let result = insights
//!     .aggregate(&AggregationSpec::new("DATE", "CASES").limit(30))
//!     .unwrap();
//! let forecast = covid_insights::analytics::forecast(&result.rows, 7);
//! ```

pub mod analytics;
pub mod annotations;
#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod config;
pub mod connection;
pub mod dataset;
pub mod error;
pub mod models;
pub mod normalize;
pub mod queries;
pub mod sql_builder;

pub use annotations::AnnotationStore;
#[cfg(feature = "async")]
pub use async_client::AsyncCovidInsights;
pub use cache::TtlCache;
pub use config::Settings;
pub use connection::Connection;
pub use dataset::DatasetStore;
pub use error::{InsightsError, Result};
pub use models::{AggFunction, AggregationSpec, Cached, TimeSeriesRow};
pub use normalize::{normalize, JsonRow};
pub use sql_builder::SqlBuilder;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use models::{
    ForecastPoint, MobilityRow, MonthlyCorrelation, ObservedPoint, Record, SeriesSummary,
};

// ---------------------------------------------------------------------------
// CovidInsightsBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`CovidInsights`] instance.
///
/// Starts from [`Settings::default()`]; use [`settings`](Self::settings) to
/// supply settings loaded with [`Settings::from_env`].
#[derive(Default)]
pub struct CovidInsightsBuilder {
    settings: Settings,
}

impl CovidInsightsBuilder {
    /// Replace all settings at once.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Point a logical view (`covid`, `cases`, `mobility`) at a local path or
    /// `http(s)` URL.
    pub fn source(mut self, view: &str, location: &str) -> Self {
        self.settings
            .sources
            .insert(view.to_string(), location.to_string());
        self
    }

    /// Directory for downloaded dataset files.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.settings.cache_dir = path.as_ref().to_path_buf();
        self
    }

    /// Directory holding the annotations document.
    pub fn annotations_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.settings.annotations_dir = path.as_ref().to_path_buf();
        self
    }

    /// Never download; only use already cached dataset files.
    pub fn offline(mut self, offline: bool) -> Self {
        self.settings.offline = offline;
        self
    }

    /// HTTP timeout for dataset downloads. Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Build the service, creating the dataset store and DuckDB connection.
    ///
    /// No dataset is fetched here; views are registered on first query.
    pub fn build(self) -> Result<CovidInsights> {
        let settings = self.settings;
        let datasets = DatasetStore::new(
            settings.cache_dir.clone(),
            settings.sources.clone(),
            settings.offline,
            settings.timeout,
        )?;
        let conn = Connection::new(datasets)?;
        Ok(CovidInsights::with_connection(conn, settings))
    }
}

// ---------------------------------------------------------------------------
// CovidInsights
// ---------------------------------------------------------------------------

/// Service facade composing the warehouse connection, the result caches, and
/// the analytics engines.
///
/// Each instance owns its own caches, so two instances never share entries.
pub struct CovidInsights {
    conn: Connection,
    settings: Settings,
    aggregate_cache: TtlCache<Vec<TimeSeriesRow>>,
    mobility_cache: TtlCache<Vec<Record>>,
}

impl CovidInsights {
    /// Create a new builder for configuring the service.
    pub fn builder() -> CovidInsightsBuilder {
        CovidInsightsBuilder::default()
    }

    /// Build a service from [`Settings::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::builder().settings(Settings::from_env()).build()
    }

    /// Wrap an existing connection, e.g. one with tables registered by hand.
    pub fn with_connection(conn: Connection, settings: Settings) -> Self {
        Self {
            conn,
            settings,
            aggregate_cache: TtlCache::new(),
            mobility_cache: TtlCache::new(),
        }
    }

    // -- Query accessors ---------------------------------------------------

    /// Uncached aggregation interface over the connection.
    pub fn aggregates(&self) -> queries::AggregateQuery<'_> {
        queries::AggregateQuery::new(&self.conn)
    }

    /// Uncached monthly cases/mobility interface over the connection.
    pub fn mobility_query(&self) -> queries::MobilityQuery<'_> {
        queries::MobilityQuery::new(&self.conn, &self.settings.mobility)
    }

    /// Annotation store rooted at the configured directory.
    pub fn annotations(&self) -> AnnotationStore {
        AnnotationStore::new(&self.settings.annotations_dir)
    }

    // -- Cached views ------------------------------------------------------

    /// Aggregate the covid view, serving from the cache while fresh.
    pub fn aggregate(&self, spec: &AggregationSpec) -> Result<Cached<Vec<TimeSeriesRow>>> {
        spec.validate()?;
        let key = spec.cache_key();
        if let Some(rows) = self.aggregate_cache.get(&key) {
            tracing::debug!(%key, "aggregate cache hit");
            return Ok(Cached { cached: true, rows });
        }
        tracing::debug!(%key, "aggregate cache miss");
        let rows = self.aggregates().series(config::COVID_VIEW, spec)?;
        self.aggregate_cache.set(key, rows.clone(), config::AGGREGATE_TTL);
        Ok(Cached { cached: false, rows })
    }

    /// Monthly cases joined with monthly mobility, normalized for transport.
    pub fn mobility(&self) -> Result<Cached<Vec<JsonRow>>> {
        let (cached, records) = self.mobility_records()?;
        Ok(Cached {
            cached,
            rows: normalize::normalize(records),
        })
    }

    /// Mobility factors per month, taken from the cached join.
    pub fn mobility_rows(&self) -> Result<Vec<MobilityRow>> {
        let (_, records) = self.mobility_records()?;
        Ok(records.iter().filter_map(MobilityRow::from_record).collect())
    }

    fn mobility_records(&self) -> Result<(bool, Vec<Record>)> {
        const KEY: &str = "mobility:joined_data";
        if let Some(records) = self.mobility_cache.get(KEY) {
            tracing::debug!(key = KEY, "mobility cache hit");
            return Ok((true, records));
        }
        let records = self.mobility_query().joined_records()?;
        self.mobility_cache.set(KEY, records.clone(), config::MOBILITY_TTL);
        Ok((false, records))
    }

    // -- Analytics ---------------------------------------------------------

    /// Default daily series used by the analytics views.
    pub fn analytics_series(&self) -> Result<Vec<TimeSeriesRow>> {
        let spec = AggregationSpec::new(config::DEFAULT_DATE_COLUMN, config::DEFAULT_VALUE_COLUMN)
            .limit(config::DEFAULT_ROW_LIMIT);
        Ok(self.aggregate(&spec)?.rows)
    }

    /// Descriptive statistics of the default series; `None` when it is empty.
    pub fn summary(&self) -> Result<Option<SeriesSummary>> {
        Ok(analytics::summarize(&self.analytics_series()?))
    }

    /// Project `periods` days past the default series.
    pub fn forecast(&self, periods: usize) -> Result<Vec<ForecastPoint>> {
        Ok(analytics::forecast(&self.analytics_series()?, periods))
    }

    /// The default series with its 7-point moving average.
    pub fn observed(&self) -> Result<Vec<ObservedPoint>> {
        Ok(analytics::observed(&self.analytics_series()?))
    }

    /// Correlate the monthly totals of `value_column` with monthly mobility.
    ///
    /// An unreachable mobility source degrades to an empty mobility series,
    /// which yields no coefficients and an empty table.
    pub fn correlation(&self, value_column: &str) -> Result<MonthlyCorrelation> {
        let spec = AggregationSpec::new(config::DEFAULT_DATE_COLUMN, value_column)
            .limit(config::CORRELATION_ROW_LIMIT);
        let daily = self.aggregate(&spec)?.rows;
        let mobility = match self.mobility_rows() {
            Ok(rows) => rows,
            Err(InsightsError::UpstreamUnavailable(msg)) => {
                tracing::warn!(%msg, "mobility source unavailable; correlating without it");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(analytics::monthly_correlation(&daily, &mobility))
    }

    // -- Metadata and utility methods --------------------------------------

    /// Columns of the covid view.
    pub fn columns(&self) -> Result<Vec<String>> {
        self.aggregates().columns(config::COVID_VIEW)
    }

    /// First `limit` raw rows of the covid view.
    pub fn sample(&self, limit: usize) -> Result<Vec<JsonRow>> {
        self.aggregates().sample(config::COVID_VIEW, limit)
    }

    /// Execute a raw SQL query with `?` placeholders.
    pub fn sql(&self, query: &str, params: &[String]) -> Result<Vec<JsonRow>> {
        self.conn.execute(query, params)
    }

    /// Warehouse engine version; doubles as a connectivity check.
    pub fn engine_version(&self) -> Result<String> {
        self.conn.engine_version()
    }

    /// Non-secret summary of the active settings.
    pub fn config_summary(&self) -> serde_json::Value {
        self.settings.summary()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Registered view names.
    pub fn views(&self) -> Vec<String> {
        self.conn.views()
    }

    /// Drop all cached results and registered views.
    ///
    /// Views are re-registered and results recomputed on next access.
    pub fn invalidate(&self) {
        self.aggregate_cache.clear();
        self.mobility_cache.clear();
        self.conn.reset_views();
    }

    /// Return a reference to the underlying [`Connection`].
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for CovidInsights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CovidInsights(table={}, views=[{}], cached_aggregates={}, offline={})",
            self.settings.covid_table,
            self.conn.views().join(", "),
            self.aggregate_cache.len(),
            self.settings.offline
        )
    }
}
