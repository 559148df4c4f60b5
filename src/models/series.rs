use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{Field, Record};
use crate::config::DEFAULT_ROW_LIMIT;
use crate::error::{InsightsError, Result};

// ---------------------------------------------------------------------------
// AggFunction: Reduction applied to each date (and geo) group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunction {
    #[default]
    Sum,
    Avg,
    Min,
    Max,
}

impl AggFunction {
    /// Parse a function name case-insensitively.
    ///
    /// Unknown or empty names fall back to [`AggFunction::Sum`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "avg" => AggFunction::Avg,
            "min" => AggFunction::Min,
            "max" => AggFunction::Max,
            _ => AggFunction::Sum,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunction::Sum => "sum",
            AggFunction::Avg => "avg",
            AggFunction::Min => "min",
            AggFunction::Max => "max",
        }
    }

    /// SQL aggregate function name.
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggFunction::Sum => "SUM",
            AggFunction::Avg => "AVG",
            AggFunction::Min => "MIN",
            AggFunction::Max => "MAX",
        }
    }
}

impl From<&str> for AggFunction {
    fn from(name: &str) -> Self {
        AggFunction::parse(name)
    }
}

impl fmt::Display for AggFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AggregationSpec: Immutable request descriptor
// ---------------------------------------------------------------------------

/// Describes a grouped time-series projection over a covid table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationSpec {
    pub date_column: String,
    pub value_column: String,
    pub geo_column: Option<String>,
    pub agg_function: AggFunction,
    pub row_limit: usize,
}

impl AggregationSpec {
    pub fn new(date_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            value_column: value_column.into(),
            geo_column: None,
            agg_function: AggFunction::Sum,
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// Additionally group by a geography column. An empty name is ignored.
    pub fn geo(mut self, geo_column: impl Into<String>) -> Self {
        let geo = geo_column.into();
        self.geo_column = if geo.trim().is_empty() { None } else { Some(geo) };
        self
    }

    pub fn agg(mut self, agg_function: impl Into<AggFunction>) -> Self {
        self.agg_function = agg_function.into();
        self
    }

    pub fn limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Reject descriptors that cannot produce a meaningful query.
    pub fn validate(&self) -> Result<()> {
        if self.date_column.trim().is_empty() {
            return Err(InsightsError::InvalidArgument("date column must not be empty".into()));
        }
        if self.value_column.trim().is_empty() {
            return Err(InsightsError::InvalidArgument("value column must not be empty".into()));
        }
        if self.row_limit == 0 {
            return Err(InsightsError::InvalidArgument("row limit must be positive".into()));
        }
        Ok(())
    }

    /// Deterministic cache key covering every parameter of the request.
    pub fn cache_key(&self) -> String {
        format!(
            "agg:{}:{}:{}:{}:{}",
            self.date_column,
            self.value_column,
            self.geo_column.as_deref().unwrap_or("None"),
            self.agg_function,
            self.row_limit
        )
    }
}

// ---------------------------------------------------------------------------
// TimeSeriesRow: One aggregated (date, value[, geo]) point
// ---------------------------------------------------------------------------

/// A NULL date or aggregated value stays in the row as `None` and
/// serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow {
    pub date: Option<NaiveDate>,
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<String>,
}

impl TimeSeriesRow {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date: Some(date),
            value: Some(value),
            geo: None,
        }
    }

    /// The `(date, value)` pair when both are present.
    pub fn point(&self) -> Option<(NaiveDate, f64)> {
        Some((self.date?, self.value?))
    }

    /// Read a row from a record using the `date`, `value`, `geo` vocabulary.
    ///
    /// Null cells become `None`. A non-null date cell that is not a
    /// recognizable date fails with [`InsightsError::InvalidValue`].
    pub fn from_record(record: &Record) -> Result<Self> {
        let date = match record.get("date") {
            None | Some(Field::Null) => None,
            Some(field) => Some(field.as_date().ok_or_else(|| InsightsError::InvalidValue {
                column: "date".to_string(),
                value: field.to_string(),
            })?),
        };
        let value = record.get("value").and_then(Field::as_f64);
        let geo = record.get("geo").and_then(|f| match f {
            Field::Null => None,
            Field::Text(s) => Some(s.clone()),
            Field::Int(n) => Some(n.to_string()),
            other => other.as_date().map(|d| d.to_string()),
        });
        Ok(Self { date, value, geo })
    }
}

/// Response wrapper marking whether rows came from the result cache.
#[derive(Debug, Clone, Serialize)]
pub struct Cached<T> {
    pub cached: bool,
    pub rows: T,
}
