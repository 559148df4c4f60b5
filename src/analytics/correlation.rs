//! Monthly resampling of a daily series, the left join onto monthly
//! mobility, and per-factor Pearson correlation.
//!
//! Correlation is pairwise-complete: each factor uses every month where both
//! the case total and that factor are present, independently of the other
//! factors. The "has any mobility" row filter, by contrast, looks at all
//! three factors jointly.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::config::TABLE_VIEW_MONTHS;
use crate::models::{
    CorrelationSummary, FactorCorrelation, MergedMonth, MobilityFactor, MobilityRow,
    MonthlyCorrelation, MonthlyTableRow, MonthlyValue, TimeSeriesRow,
};

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Sum daily values into calendar-month buckets, ascending by month.
///
/// Months without any dated day are absent. Missing and NaN values are
/// skipped; rows without a date are ignored.
pub fn resample_monthly(daily: &[TimeSeriesRow]) -> Vec<MonthlyValue> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in daily {
        let Some(date) = row.date else { continue };
        let total = buckets.entry(month_start(date)).or_insert(0.0);
        if let Some(value) = row.value.filter(|v| !v.is_nan()) {
            *total += value;
        }
    }
    buckets
        .into_iter()
        .map(|(month, value)| MonthlyValue { month, value })
        .collect()
}

/// Left-join `monthly` onto `mobility` by exact month.
///
/// Months absent from `monthly` are dropped; rows with no mobility factor at
/// all are removed. If `mobility` repeats a month, the first row wins.
pub fn merge_monthly(monthly: &[MonthlyValue], mobility: &[MobilityRow]) -> Vec<MergedMonth> {
    let mut by_month: HashMap<NaiveDate, &MobilityRow> = HashMap::new();
    for row in mobility {
        by_month.entry(row.month).or_insert(row);
    }

    let mut merged: Vec<MergedMonth> = monthly
        .iter()
        .map(|m| {
            let mob = by_month.get(&m.month);
            MergedMonth {
                month: m.month,
                monthly_value: m.value,
                retail: mob.and_then(|r| r.factor(MobilityFactor::Retail)),
                workplaces: mob.and_then(|r| r.factor(MobilityFactor::Workplaces)),
                residential: mob.and_then(|r| r.factor(MobilityFactor::Residential)),
            }
        })
        .filter(MergedMonth::has_any_mobility)
        .collect();
    merged.sort_by_key(|m| m.month);
    merged
}

/// Pearson correlation coefficient of paired samples.
///
/// `None` with fewer than two pairs or when either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x * var_y).sqrt();
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Coefficient of each factor against the monthly case total.
pub fn factor_correlations(merged: &[MergedMonth]) -> CorrelationSummary {
    let coefficients = MobilityFactor::ALL
        .iter()
        .filter_map(|&factor| {
            let pairs: Vec<(f64, f64)> = merged
                .iter()
                .filter(|m| m.monthly_value.is_finite())
                .filter_map(|m| m.factor(factor).map(|v| (m.monthly_value, v)))
                .collect();
            pearson(&pairs).map(|r| FactorCorrelation {
                factor,
                coefficient: round_to(r, 2),
            })
        })
        .collect();
    CorrelationSummary { coefficients }
}

/// The most recent `months` merged rows in chronological order, mobility
/// rounded to one decimal and months rendered `YYYY-MM`.
pub fn table_view(merged: &[MergedMonth], months: usize) -> Vec<MonthlyTableRow> {
    let skip = merged.len().saturating_sub(months);
    merged
        .iter()
        .skip(skip)
        .map(|m| MonthlyTableRow {
            month: m.month.format("%Y-%m").to_string(),
            monthly_value: m.monthly_value,
            retail: m.retail.map(|v| round_to(v, 1)),
            workplaces: m.workplaces.map(|v| round_to(v, 1)),
            residential: m.residential.map(|v| round_to(v, 1)),
        })
        .collect()
}

/// Resample, merge, correlate, and build the bounded table in one pass.
pub fn correlate(
    daily: &[TimeSeriesRow],
    mobility: &[MobilityRow],
) -> (CorrelationSummary, Vec<MonthlyTableRow>) {
    let monthly = resample_monthly(daily);
    let merged = merge_monthly(&monthly, mobility);
    (factor_correlations(&merged), table_view(&merged, TABLE_VIEW_MONTHS))
}

/// [`correlate`] packaged with the rendered summary line.
pub fn monthly_correlation(daily: &[TimeSeriesRow], mobility: &[MobilityRow]) -> MonthlyCorrelation {
    let (summary, table) = correlate(daily, mobility);
    MonthlyCorrelation {
        summary_text: summary.to_string(),
        summary,
        table,
    }
}

// Exact ties go to the even digit: 0.25 -> 0.2, 0.75 -> 0.8.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
