//! Shared test fixtures for the covid-insights integration tests.
//!
//! `setup_sample_db()` creates an in-memory DuckDB connection with small
//! `covid`, `cases`, and `mobility` tables loaded from NDJSON temp files.
//! `setup_insights()` wraps the same connection in a [`CovidInsights`].

#![allow(dead_code)]

use chrono::NaiveDate;
use covid_insights::{CovidInsights, Connection, DatasetStore, Settings};
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Create a `Connection` backed by an offline dataset store in a temporary
/// directory, with the sample tables registered.
///
/// Returns `(Connection, tempfile::TempDir)`. The caller must keep the `TempDir`
/// alive for the duration of the test.
pub fn setup_sample_db() -> (Connection, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let datasets = DatasetStore::new(
        tmp_dir.path().join("datasets"),
        HashMap::new(),
        true,
        Duration::from_secs(5),
    )
    .unwrap();
    let conn = Connection::new(datasets).unwrap();

    // -- covid: daily per-county rows, deliberately out of date order ---------
    register_covid(&conn);

    // -- cases: county report used for monthly totals -------------------------
    register_cases(&conn);

    // -- mobility: state-level and county-level change percentages -------------
    register_mobility(&conn);

    (conn, tmp_dir)
}

/// Settings pointing every directory into `root`, offline.
pub fn test_settings(root: &std::path::Path) -> Settings {
    Settings {
        cache_dir: root.join("datasets"),
        annotations_dir: root.join("annotations"),
        offline: true,
        ..Settings::default()
    }
}

/// A service over the sample tables.
pub fn setup_insights() -> (CovidInsights, tempfile::TempDir) {
    let (conn, tmp_dir) = setup_sample_db();
    let settings = test_settings(tmp_dir.path());
    (CovidInsights::with_connection(conn, settings), tmp_dir)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily totals per date: 03-01 = 15, 03-02 = 27, 03-03 = 39, 03-04 = 40.
fn register_covid(conn: &Connection) {
    let rows = vec![
        serde_json::json!({"DATE": "2020-03-03", "COUNTY": "Alameda", "CASES": 30, "DEATHS": 1}),
        serde_json::json!({"DATE": "2020-03-01", "COUNTY": "Alameda", "CASES": 10, "DEATHS": 0}),
        serde_json::json!({"DATE": "2020-03-02", "COUNTY": "Alameda", "CASES": 20, "DEATHS": 0}),
        serde_json::json!({"DATE": "2020-03-01", "COUNTY": "Fresno", "CASES": 5, "DEATHS": 0}),
        serde_json::json!({"DATE": "2020-03-02", "COUNTY": "Fresno", "CASES": 7, "DEATHS": 1}),
        serde_json::json!({"DATE": "2020-03-03", "COUNTY": "Fresno", "CASES": 9, "DEATHS": 2}),
        serde_json::json!({"DATE": "2020-03-04", "COUNTY": "Alameda", "CASES": 40, "DEATHS": 3}),
    ];

    write_ndjson_and_register(conn, "covid", &rows);
}

/// County monthly totals: Jan = 150, Feb = 300, Mar = 400. The `Unknown`
/// area and the state-level row must be filtered out.
fn register_cases(conn: &Connection) {
    let rows = vec![
        serde_json::json!({"DATE": "2020-01-05", "AREA": "Alameda", "AREA_TYPE": "County", "CASES": 100}),
        serde_json::json!({"DATE": "2020-01-20", "AREA": "Fresno", "AREA_TYPE": "County", "CASES": 50}),
        serde_json::json!({"DATE": "2020-01-10", "AREA": "Unknown", "AREA_TYPE": "County", "CASES": 999}),
        serde_json::json!({"DATE": "2020-01-10", "AREA": "California", "AREA_TYPE": "State", "CASES": 5000}),
        serde_json::json!({"DATE": "2020-02-03", "AREA": "Alameda", "AREA_TYPE": "County", "CASES": 200}),
        serde_json::json!({"DATE": "2020-02-15", "AREA": "Fresno", "AREA_TYPE": "County", "CASES": 100}),
        serde_json::json!({"DATE": "2020-03-01", "AREA": "Alameda", "AREA_TYPE": "County", "CASES": 400}),
    ];

    write_ndjson_and_register(conn, "cases", &rows);
}

/// State-level monthly means: Jan = (-3, 2, 1), Feb = (-10, -6, 4), no March.
fn register_mobility(conn: &Connection) {
    let rows = vec![
        mobility_row("2020-01-02", "California", None, -2.0, 1.0, 0.5),
        mobility_row("2020-01-20", "California", None, -4.0, 3.0, 1.5),
        mobility_row("2020-01-15", "California", Some("Alameda County"), -50.0, -50.0, 50.0),
        mobility_row("2020-02-10", "California", None, -10.0, -6.0, 4.0),
        mobility_row("2020-02-10", "Texas", None, -99.0, -99.0, 99.0),
    ];

    write_ndjson_and_register(conn, "mobility", &rows);
}

fn mobility_row(
    date: &str,
    province: &str,
    sub_region: Option<&str>,
    retail: f64,
    workplaces: f64,
    residential: f64,
) -> serde_json::Value {
    serde_json::json!({
        "DATE": date,
        "COUNTRY_REGION": "United States",
        "PROVINCE_STATE": province,
        "SUB_REGION_2": sub_region,
        "RETAIL_AND_RECREATION_CHANGE_PERC": retail,
        "WORKPLACES_CHANGE_PERC": workplaces,
        "RESIDENTIAL_CHANGE_PERC": residential,
    })
}

/// Write a slice of JSON values as NDJSON to a temp file and register it
/// as a DuckDB table via `Connection::register_table_from_ndjson`.
pub fn write_ndjson_and_register(conn: &Connection, table_name: &str, rows: &[serde_json::Value]) {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    conn.register_table_from_ndjson(table_name, path).unwrap();
}
