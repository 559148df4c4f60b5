//! DuckDB connection wrapper: dataset view registration, column
//! introspection, and typed query execution.
//!
//! Views are registered lazily from the [`DatasetStore`] on first use. Query
//! results come back as typed [`Record`]s, or as normalized JSON rows via
//! [`Connection::execute`].

use crate::dataset::DatasetStore;
use crate::error::{InsightsError, Result};
use crate::models::{Field, Record};
use crate::normalize::{self, JsonRow};
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection as DuckDbConnection;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

/// Wraps a DuckDB connection and registers dataset files as views.
pub struct Connection {
    conn: DuckDbConnection,
    /// Resolves configured datasets to local files.
    pub datasets: RefCell<DatasetStore>,
    registered_views: RefCell<HashSet<String>>,
}

impl Connection {
    /// Create a connection backed by the given dataset store.
    ///
    /// Opens an in-memory DuckDB database.
    pub fn new(datasets: DatasetStore) -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self {
            conn,
            datasets: RefCell::new(datasets),
            registered_views: RefCell::new(HashSet::new()),
        })
    }

    /// Ensure one or more views are registered, fetching dataset files if needed.
    pub fn ensure_views(&self, views: &[&str]) -> Result<()> {
        for name in views {
            if !self.registered_views.borrow().contains(*name) {
                self.ensure_view(name)?;
            }
        }
        Ok(())
    }

    /// Execute SQL and return typed records in result-set column order.
    pub fn query_records(&self, sql: &str, params: &[String]) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the query has run.
        let column_names: Vec<String> = match rows.as_ref() {
            Some(stmt) => stmt.column_names().into_iter().map(|s| s.to_string()).collect(),
            None => return Ok(Vec::new()),
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, name) in column_names.iter().enumerate() {
                record.insert(name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(record);
        }

        Ok(out)
    }

    /// Execute SQL and return normalized, transport-safe rows.
    pub fn execute(&self, sql: &str, params: &[String]) -> Result<Vec<JsonRow>> {
        let records = self.query_records(sql, params)?;
        Ok(normalize::normalize(records))
    }

    /// Execute SQL and deserialize each normalized row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(&self, sql: &str, params: &[String]) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(&self, sql: &str, params: &[String]) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            Ok(Some(normalize::field_value(convert_value_ref(row.get_ref(0)?))))
        } else {
            Ok(None)
        }
    }

    /// Version string of the embedded warehouse engine.
    pub fn engine_version(&self) -> Result<String> {
        let version = self.execute_scalar("SELECT version()", &[])?;
        Ok(version
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string()))
    }

    /// Create a DuckDB table from a newline-delimited JSON file.
    pub fn register_table_from_ndjson(&self, table_name: &str, ndjson_path: &str) -> Result<()> {
        let path_fwd = sql_path(Path::new(ndjson_path));
        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; \
             CREATE TABLE {table} AS SELECT * FROM read_json_auto('{path}', format='newline_delimited')",
            table = table_name,
            path = path_fwd
        ))?;
        self.registered_views.borrow_mut().insert(table_name.to_string());
        Ok(())
    }

    /// Create or replace a view over a dataset file.
    ///
    /// The reader is chosen by extension: parquet, CSV/TSV (optionally
    /// gzipped), or JSON/NDJSON.
    pub fn register_source(&self, view_name: &str, path: &Path) -> Result<()> {
        let reader = reader_for(path)?;
        let path_str = sql_path(path);
        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE VIEW {} AS SELECT * FROM {}('{}')",
            view_name, reader, path_str
        ))?;
        self.registered_views.borrow_mut().insert(view_name.to_string());
        tracing::info!(view = view_name, path = %path_str, "registered view");
        Ok(())
    }

    /// Column names of a view, in schema order.
    pub fn columns(&self, view_name: &str) -> Result<Vec<String>> {
        self.ensure_views(&[view_name])?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT column_name FROM (DESCRIBE SELECT * FROM {})",
            view_name
        ))?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            columns.push(name);
        }
        Ok(columns)
    }

    /// Find `column` in `view_name` ignoring case and return its real name.
    ///
    /// Fails with [`InsightsError::Schema`] when the column is absent.
    pub fn resolve_column(&self, view_name: &str, column: &str) -> Result<String> {
        let columns = self.columns(view_name)?;
        if let Some(exact) = columns.iter().find(|c| c.as_str() == column) {
            return Ok(exact.clone());
        }
        columns
            .into_iter()
            .find(|c| c.eq_ignore_ascii_case(column))
            .ok_or_else(|| InsightsError::missing_column(view_name, column))
    }

    /// Check whether a view has been registered.
    pub fn has_view(&self, name: &str) -> bool {
        self.registered_views.borrow().contains(name)
    }

    /// Return a sorted list of all registered view names.
    pub fn views(&self) -> Vec<String> {
        let mut views: Vec<String> = self.registered_views.borrow().iter().cloned().collect();
        views.sort();
        views
    }

    /// Clear all registered views so they will be re-created on next access.
    pub fn reset_views(&self) {
        self.registered_views.borrow_mut().clear();
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }

    fn ensure_view(&self, view_name: &str) -> Result<()> {
        if self.registered_views.borrow().contains(view_name) {
            return Ok(());
        }
        let path = self.datasets.borrow_mut().ensure_file(view_name)?;
        self.register_source(view_name, &path)
    }
}

fn sql_path(path: &Path) -> String {
    // DuckDB wants forward slashes; single quotes are doubled for the literal.
    path.to_string_lossy().replace('\\', "/").replace('\'', "''")
}

fn reader_for(path: &Path) -> Result<&'static str> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext {
        "parquet" => Ok("read_parquet"),
        "csv" | "tsv" | "txt" => Ok("read_csv_auto"),
        "json" | "ndjson" | "jsonl" => Ok("read_json_auto"),
        _ => Err(InsightsError::InvalidArgument(format!(
            "Unsupported dataset format: {}",
            path.display()
        ))),
    }
}

/// Convert a DuckDB `ValueRef` to a typed [`Field`].
fn convert_value_ref(val: ValueRef<'_>) -> Field {
    match val {
        ValueRef::Null => Field::Null,
        ValueRef::Boolean(b) => Field::Bool(b),
        ValueRef::TinyInt(n) => Field::Int(n.into()),
        ValueRef::SmallInt(n) => Field::Int(n.into()),
        ValueRef::Int(n) => Field::Int(n.into()),
        ValueRef::BigInt(n) => Field::Int(n),
        ValueRef::UTinyInt(n) => Field::Int(n.into()),
        ValueRef::USmallInt(n) => Field::Int(n.into()),
        ValueRef::UInt(n) => Field::Int(n.into()),
        ValueRef::UBigInt(n) => i64::try_from(n)
            .map(Field::Int)
            .unwrap_or(Field::Float(n as f64)),
        // SUM over integers widens to HUGEINT
        ValueRef::HugeInt(n) => i64::try_from(n)
            .map(Field::Int)
            .unwrap_or(Field::Float(n as f64)),
        ValueRef::Float(f) => Field::Float(f as f64),
        ValueRef::Double(f) => Field::Float(f),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(Field::Float)
            .unwrap_or(Field::Null),
        ValueRef::Text(bytes) => Field::Text(String::from_utf8_lossy(bytes).to_string()),
        ValueRef::Blob(bytes) => Field::Text(format!(
            "blob:{}",
            bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()
        )),
        ValueRef::Date32(days) => days
            .checked_add(UNIX_EPOCH_CE_DAYS)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(Field::Date)
            .unwrap_or(Field::Null),
        ValueRef::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|dt| Field::Timestamp(dt.naive_utc()))
                .unwrap_or(Field::Null)
        }
        // Time, Interval, and nested types have no place in a time-series row.
        _ => Field::Null,
    }
}
