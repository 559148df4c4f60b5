//! Short-horizon projection and descriptive statistics of a daily series.
//!
//! The trend estimate is the average step between the first and last
//! observation, `(last - first) / len`. Projections are floored at zero
//! since case and death counts cannot be negative.

use chrono::{Days, NaiveDate};

use crate::config::MOVING_AVERAGE_WINDOW;
use crate::models::{
    DateRange, ForecastPoint, ObservedPoint, PointKind, SeriesSummary, TimeSeriesRow, Trend,
};

/// The `(date, value)` points of `series` sorted ascending by date (stable
/// for equal dates). Rows missing either field are left out.
fn sorted(series: &[TimeSeriesRow]) -> Vec<(NaiveDate, f64)> {
    let mut points: Vec<(NaiveDate, f64)> = series.iter().filter_map(TimeSeriesRow::point).collect();
    points.sort_by_key(|(date, _)| *date);
    points
}

/// Project `horizon` daily values past the last observation.
///
/// Returns an empty vector for an empty series or a zero horizon.
pub fn forecast(series: &[TimeSeriesRow], horizon: usize) -> Vec<ForecastPoint> {
    if horizon == 0 {
        return Vec::new();
    }
    let points = sorted(series);
    let (&(_, first), &(last_date, last)) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Vec::new(),
    };
    let trend = (last - first) / points.len() as f64;

    (1..=horizon)
        .map_while(|step| {
            let date = last_date.checked_add_days(Days::new(step as u64))?;
            let value = (last + trend * step as f64).max(0.0);
            Some(ForecastPoint {
                date,
                value,
                kind: PointKind::Forecast,
            })
        })
        .collect()
}

/// Trailing mean over `window` points.
///
/// The first `window - 1` positions have no full window and are `None`.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            Some(slice.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// The sorted series annotated with its 7-point trailing moving average.
pub fn observed(series: &[TimeSeriesRow]) -> Vec<ObservedPoint> {
    let points = sorted(series);
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let averages = moving_average(&values, MOVING_AVERAGE_WINDOW);
    points
        .into_iter()
        .zip(averages)
        .map(|((date, value), moving_average)| ObservedPoint {
            date,
            value,
            moving_average,
        })
        .collect()
}

/// Totals, mean, maximum, date bounds, and direction of the series.
///
/// Returns `None` when no row has both a date and a value. A last value
/// equal to the first counts as decreasing.
pub fn summarize(series: &[TimeSeriesRow]) -> Option<SeriesSummary> {
    let points = sorted(series);
    let &(start, first) = points.first()?;
    let &(end, last) = points.last()?;

    let total: f64 = points.iter().map(|(_, v)| v).sum();
    let max = points.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);

    Some(SeriesSummary {
        total_records: points.len(),
        date_range: DateRange { start, end },
        total_cases: total,
        avg_cases_per_day: total / points.len() as f64,
        max_cases_in_day: max,
        trend: if last > first {
            Trend::Increasing
        } else {
            Trend::Decreasing
        },
    })
}
