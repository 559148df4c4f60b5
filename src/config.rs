//! Runtime settings, dataset locations, and service-wide constants.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};

/// How long aggregation results stay fresh in the result cache.
pub const AGGREGATE_TTL: Duration = Duration::from_secs(300);
/// How long the monthly cases/mobility join stays fresh.
pub const MOBILITY_TTL: Duration = Duration::from_secs(600);

pub const DEFAULT_ROW_LIMIT: usize = 1000;
pub const DEFAULT_SAMPLE_LIMIT: usize = 5;
pub const DEFAULT_FORECAST_PERIODS: usize = 7;
pub const MOVING_AVERAGE_WINDOW: usize = 7;
/// Row limit used when pulling a full daily series for the monthly correlation.
pub const CORRELATION_ROW_LIMIT: usize = 20_000;
/// Number of most recent months kept in the correlation table view.
pub const TABLE_VIEW_MONTHS: usize = 12;

pub const DEFAULT_DATE_COLUMN: &str = "DATE";
pub const DEFAULT_VALUE_COLUMN: &str = "CASES";

/// Logical view names registered in the warehouse.
pub const COVID_VIEW: &str = "covid";
pub const CASES_VIEW: &str = "cases";
pub const MOBILITY_VIEW: &str = "mobility";

const DEFAULT_COVID_TABLE: &str = "CALIFORNIA_COVID19_DATASETS.PUBLIC.CASE_RATES_BY_ZIP";

/// Column and filter names used to build the monthly cases/mobility join.
#[derive(Debug, Clone)]
pub struct MobilityConfig {
    pub date_column: String,
    pub cases_column: String,
    pub area_type_column: String,
    pub area_column: String,
    pub area_type: String,
    pub excluded_area: String,
    pub country_column: String,
    pub province_column: String,
    pub sub_region_column: String,
    pub country: String,
    pub province: String,
    pub retail_column: String,
    pub workplaces_column: String,
    pub residential_column: String,
}

impl Default for MobilityConfig {
    fn default() -> Self {
        Self {
            date_column: "DATE".into(),
            cases_column: "CASES".into(),
            area_type_column: "AREA_TYPE".into(),
            area_column: "AREA".into(),
            area_type: "County".into(),
            excluded_area: "Unknown".into(),
            country_column: "COUNTRY_REGION".into(),
            province_column: "PROVINCE_STATE".into(),
            sub_region_column: "SUB_REGION_2".into(),
            country: "United States".into(),
            province: "California".into(),
            retail_column: "RETAIL_AND_RECREATION_CHANGE_PERC".into(),
            workplaces_column: "WORKPLACES_CHANGE_PERC".into(),
            residential_column: "RESIDENTIAL_CHANGE_PERC".into(),
        }
    }
}

/// Settings for a [`CovidInsights`](crate::CovidInsights) instance.
///
/// `sources` maps a logical view name (see [`COVID_VIEW`], [`CASES_VIEW`],
/// [`MOBILITY_VIEW`]) to a local path or an `http(s)` URL.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Display name of the aggregated covid table.
    pub covid_table: String,
    pub sources: HashMap<String, String>,
    pub cache_dir: PathBuf,
    pub annotations_dir: PathBuf,
    pub offline: bool,
    pub timeout: Duration,
    pub mobility: MobilityConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            covid_table: DEFAULT_COVID_TABLE.to_string(),
            sources: HashMap::new(),
            cache_dir: default_cache_dir(),
            annotations_dir: default_annotations_dir(),
            offline: false,
            timeout: Duration::from_secs(120),
            mobility: MobilityConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// A `.env` file in the working directory (or a parent) is applied first;
    /// real environment variables take precedence over it.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(table) = lookup("COVID_TABLE") {
            settings.covid_table = table;
        }
        for (key, view) in [
            ("COVID_SOURCE", COVID_VIEW),
            ("CASES_SOURCE", CASES_VIEW),
            ("MOBILITY_SOURCE", MOBILITY_VIEW),
        ] {
            if let Some(location) = lookup(key).filter(|v| !v.trim().is_empty()) {
                settings.sources.insert(view.to_string(), location);
            }
        }
        if let Some(dir) = lookup("INSIGHTS_CACHE_DIR") {
            settings.cache_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("NOSQL_DIR") {
            settings.annotations_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("INSIGHTS_OFFLINE") {
            settings.offline = parse_bool(&flag);
        }
        if let Some(secs) = lookup("INSIGHTS_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()) {
            settings.timeout = Duration::from_secs(secs);
        }

        settings
    }

    /// Non-secret summary of the active configuration.
    pub fn summary(&self) -> Value {
        let mut sources: Vec<(&String, &String)> = self.sources.iter().collect();
        sources.sort();
        json!({
            "covid_table": self.covid_table,
            "sources": sources
                .into_iter()
                .map(|(view, location)| json!({ "view": view, "location": location }))
                .collect::<Vec<_>>(),
            "cache_dir": self.cache_dir.display().to_string(),
            "annotations_dir": self.annotations_dir.display().to_string(),
            "offline": self.offline,
            "timeout_secs": self.timeout.as_secs(),
            "note": "Set COVID_SOURCE, CASES_SOURCE and MOBILITY_SOURCE to a local file or http(s) URL",
        })
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("covid-insights")
    } else {
        PathBuf::from(".covid-insights-cache")
    }
}

pub fn default_annotations_dir() -> PathBuf {
    env::current_dir()
        .map(|d| d.join("data"))
        .unwrap_or_else(|_| PathBuf::from("data"))
}
