//! Grouped time-series projections over a covid table.

use crate::connection::Connection;
use crate::error::{InsightsError, Result};
use crate::models::{AggregationSpec, Record, TimeSeriesRow};
use crate::normalize::{self, JsonRow};
use crate::sql_builder::{quote_ident, SqlBuilder};

// ---------------------------------------------------------------------------
// AggregateQuery
// ---------------------------------------------------------------------------

/// Query interface turning an [`AggregationSpec`] into ordered, limited rows.
///
/// Output columns always use the lower-case vocabulary `date`, `geo` (when
/// grouped by geography), and `value`, whatever the source column casing.
pub struct AggregateQuery<'a> {
    conn: &'a Connection,
}

impl<'a> AggregateQuery<'a> {
    /// Create a new `AggregateQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Build the grouped SQL for `spec` against `table`.
    ///
    /// Every referenced column is checked against the table schema first; a
    /// missing one fails with a schema error naming it. Groups are keyed on
    /// the raw date column; conversion to a calendar date happens per row.
    pub fn build_sql(&self, table: &str, spec: &AggregationSpec) -> Result<(String, Vec<String>)> {
        spec.validate()?;

        let date_col = quote_ident(&self.conn.resolve_column(table, &spec.date_column)?);
        let value_col = quote_ident(&self.conn.resolve_column(table, &spec.value_column)?);
        let geo_col = match &spec.geo_column {
            Some(geo) => Some(quote_ident(&self.conn.resolve_column(table, geo)?)),
            None => None,
        };

        let value_expr = format!(
            "{}(TRY_CAST({} AS DOUBLE))",
            spec.agg_function.sql_name(),
            value_col
        );

        let mut qb = SqlBuilder::new(table);
        match &geo_col {
            Some(geo) => {
                qb.select(&[
                    &format!("{} AS \"date\"", date_col),
                    &format!("{} AS \"geo\"", geo),
                    &format!("{} AS \"value\"", value_expr),
                ]);
                qb.group_by(&[&date_col, geo]);
                qb.order_by(&[&format!("{} ASC", date_col), &format!("{} ASC", geo)]);
            }
            None => {
                qb.select(&[
                    &format!("{} AS \"date\"", date_col),
                    &format!("{} AS \"value\"", value_expr),
                ]);
                qb.group_by(&[&date_col]);
                qb.order_by(&[&format!("{} ASC", date_col)]);
            }
        }
        // Ordering happens before truncation, so the earliest dates survive.
        qb.limit(spec.row_limit);

        Ok(qb.build())
    }

    /// Run the aggregation and return raw records.
    pub fn records(&self, table: &str, spec: &AggregationSpec) -> Result<Vec<Record>> {
        let (sql, params) = self.build_sql(table, spec)?;
        let rows = self.conn.query_records(&sql, &params)?;
        Ok(rows.into_iter().map(lowercase_columns).collect())
    }

    /// Run the aggregation and return typed rows.
    ///
    /// Groups with a NULL date or aggregated value are kept with `None` in
    /// that field. A date that cannot be read as a calendar date fails with
    /// [`InsightsError::InvalidValue`] naming the source column.
    pub fn series(&self, table: &str, spec: &AggregationSpec) -> Result<Vec<TimeSeriesRow>> {
        self.records(table, spec)?
            .iter()
            .map(|record| {
                TimeSeriesRow::from_record(record).map_err(|e| match e {
                    InsightsError::InvalidValue { value, .. } => InsightsError::InvalidValue {
                        column: spec.date_column.clone(),
                        value,
                    },
                    other => other,
                })
            })
            .collect()
    }

    /// Run the aggregation and return normalized JSON rows.
    pub fn rows(&self, table: &str, spec: &AggregationSpec) -> Result<Vec<JsonRow>> {
        Ok(normalize::normalize(self.records(table, spec)?))
    }

    /// First `limit` raw rows of `table`, normalized.
    pub fn sample(&self, table: &str, limit: usize) -> Result<Vec<JsonRow>> {
        self.conn.ensure_views(&[table])?;
        let (sql, params) = SqlBuilder::new(table).limit(limit).build();
        self.conn.execute(&sql, &params)
    }

    /// Column names of `table`.
    pub fn columns(&self, table: &str) -> Result<Vec<String>> {
        self.conn.columns(table)
    }
}

fn lowercase_columns(record: Record) -> Record {
    record
        .into_iter()
        .map(|(name, field)| (name.to_lowercase(), field))
        .collect()
}
