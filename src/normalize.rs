//! Conversion of warehouse records into transport-safe JSON rows.
//!
//! JSON has no representation for NaN or infinities, so those become `null`.
//! Columns named like a month or date marker (`MONTH`, `date`, `first_date`,
//! ...) are rendered as `YYYY-MM-DD`. Normalization never fails.

use std::collections::HashMap;

use serde_json::{Number, Value};

use crate::models::{Field, Record};

/// A normalized row keyed by column name.
pub type JsonRow = HashMap<String, Value>;

/// Normalize every record in `records`.
pub fn normalize(records: Vec<Record>) -> Vec<JsonRow> {
    records.into_iter().map(normalize_record).collect()
}

/// Normalize a single record.
pub fn normalize_record(record: Record) -> JsonRow {
    record
        .into_iter()
        .map(|(name, field)| {
            let value = if is_date_marker(&name) {
                date_marker_value(field)
            } else {
                field_value(field)
            };
            (name, value)
        })
        .collect()
}

/// Whether a column name marks a month or date field.
pub fn is_date_marker(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with("month") || lower.ends_with("date")
}

fn date_marker_value(field: Field) -> Value {
    match field {
        Field::Date(_) | Field::Timestamp(_) | Field::Text(_) => match field.as_date() {
            Some(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            // unparseable text is left as it came
            None => field_value(field),
        },
        other => field_value(other),
    }
}

/// Transport value for a field outside any date marker column.
pub fn field_value(field: Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::Bool(b),
        Field::Int(n) => Value::Number(n.into()),
        Field::Float(f) => float_value(f),
        Field::Text(s) => Value::String(s),
        Field::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        Field::Timestamp(ts) => Value::String(ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
    }
}

/// `null` for NaN and infinities, a JSON number otherwise.
pub fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
