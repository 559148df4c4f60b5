use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::Record;

// ---------------------------------------------------------------------------
// MobilityFactor: The three mobility change-percent series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MobilityFactor {
    Retail,
    Workplaces,
    Residential,
}

impl MobilityFactor {
    pub const ALL: [MobilityFactor; 3] = [
        MobilityFactor::Retail,
        MobilityFactor::Workplaces,
        MobilityFactor::Residential,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MobilityFactor::Retail => "Retail",
            MobilityFactor::Workplaces => "Workplaces",
            MobilityFactor::Residential => "Residential",
        }
    }

    /// Upper-case column alias used by the warehouse join.
    pub fn column(&self) -> &'static str {
        match self {
            MobilityFactor::Retail => "RETAIL",
            MobilityFactor::Workplaces => "WORKPLACES",
            MobilityFactor::Residential => "RESIDENTIAL",
        }
    }
}

// ---------------------------------------------------------------------------
// MobilityRow: Monthly mean mobility change, one row per month
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MobilityRow {
    pub month: NaiveDate,
    pub retail: Option<f64>,
    pub workplaces: Option<f64>,
    pub residential: Option<f64>,
}

impl MobilityRow {
    pub fn new(month: NaiveDate) -> Self {
        Self {
            month,
            ..Default::default()
        }
    }

    pub fn with(mut self, factor: MobilityFactor, value: f64) -> Self {
        match factor {
            MobilityFactor::Retail => self.retail = Some(value),
            MobilityFactor::Workplaces => self.workplaces = Some(value),
            MobilityFactor::Residential => self.residential = Some(value),
        }
        self
    }

    /// Read a row keyed by `MONTH` with `RETAIL`, `WORKPLACES`, and
    /// `RESIDENTIAL` columns, as produced by the monthly mobility join.
    pub fn from_record(record: &Record) -> Option<Self> {
        let month = record.get("MONTH")?.as_date()?;
        let mut row = MobilityRow::new(month);
        for factor in MobilityFactor::ALL {
            if let Some(v) = record.get(factor.column()).and_then(|f| f.as_f64()) {
                row = row.with(factor, v);
            }
        }
        Some(row)
    }

    /// Value of one factor; non-finite values count as absent.
    pub fn factor(&self, factor: MobilityFactor) -> Option<f64> {
        let v = match factor {
            MobilityFactor::Retail => self.retail,
            MobilityFactor::Workplaces => self.workplaces,
            MobilityFactor::Residential => self.residential,
        };
        v.filter(|x| x.is_finite())
    }
}

// ---------------------------------------------------------------------------
// MonthlyValue / MergedMonth: Resampled case totals and their join
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyValue {
    pub month: NaiveDate,
    pub value: f64,
}

/// A monthly case total left-joined with that month's mobility, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedMonth {
    pub month: NaiveDate,
    pub monthly_value: f64,
    pub retail: Option<f64>,
    pub workplaces: Option<f64>,
    pub residential: Option<f64>,
}

impl MergedMonth {
    pub fn factor(&self, factor: MobilityFactor) -> Option<f64> {
        let v = match factor {
            MobilityFactor::Retail => self.retail,
            MobilityFactor::Workplaces => self.workplaces,
            MobilityFactor::Residential => self.residential,
        };
        v.filter(|x| x.is_finite())
    }

    pub fn has_any_mobility(&self) -> bool {
        MobilityFactor::ALL.iter().any(|f| self.factor(*f).is_some())
    }
}

// ---------------------------------------------------------------------------
// Correlation output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCorrelation {
    pub factor: MobilityFactor,
    /// Pearson coefficient rounded to two decimals.
    pub coefficient: f64,
}

/// Per-factor coefficients; factors without enough data are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub coefficients: Vec<FactorCorrelation>,
}

impl CorrelationSummary {
    pub fn get(&self, factor: MobilityFactor) -> Option<f64> {
        self.coefficients
            .iter()
            .find(|c| c.factor == factor)
            .map(|c| c.coefficient)
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

impl fmt::Display for CorrelationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficients.is_empty() {
            return f.write_str("No correlation available");
        }
        let parts: Vec<String> = self
            .coefficients
            .iter()
            .map(|c| format!("{}: {:.2}", c.factor.label(), c.coefficient))
            .collect();
        f.write_str(&parts.join(" | "))
    }
}

/// One row of the bounded monthly table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTableRow {
    /// `YYYY-MM`
    pub month: String,
    pub monthly_value: f64,
    pub retail: Option<f64>,
    pub workplaces: Option<f64>,
    pub residential: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyCorrelation {
    pub summary: CorrelationSummary,
    /// Rendered form of `summary`.
    pub summary_text: String,
    pub table: Vec<MonthlyTableRow>,
}
