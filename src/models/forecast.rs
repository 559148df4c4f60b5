use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ForecastPoint: One projected future value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Forecast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: PointKind,
}

// ---------------------------------------------------------------------------
// SeriesSummary: Descriptive statistics of an observed series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SeriesSummary {
    pub total_records: usize,
    pub date_range: DateRange,
    pub total_cases: f64,
    pub avg_cases_per_day: f64,
    pub max_cases_in_day: f64,
    pub trend: Trend,
}

// ---------------------------------------------------------------------------
// ObservedPoint: Historical value with its trailing moving average
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedPoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Absent until the window has filled.
    pub moving_average: Option<f64>,
}
