//! Connection integration tests: raw SQL execution, view registration, etc.

mod common;

use covid_insights::{Connection, DatasetStore, InsightsError};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn empty_connection(dir: &std::path::Path) -> Connection {
    let datasets = DatasetStore::new(dir.to_path_buf(), HashMap::new(), true, Duration::from_secs(5))
        .unwrap();
    Connection::new(datasets).unwrap()
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

#[test]
fn execute_returns_correct_rows() {
    let (conn, _tmp) = common::setup_sample_db();

    let rows = conn
        .execute(
            "SELECT COUNTY, CASES FROM covid WHERE \"DATE\" = '2020-03-01' ORDER BY COUNTY",
            &[],
        )
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["COUNTY"], "Alameda");
    assert_eq!(rows[1]["COUNTY"], "Fresno");
}

#[test]
fn execute_with_params() {
    let (conn, _tmp) = common::setup_sample_db();

    let rows = conn
        .execute("SELECT * FROM covid WHERE COUNTY = ?", &["Fresno".to_string()])
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn execute_returns_empty_for_no_matches() {
    let (conn, _tmp) = common::setup_sample_db();

    let rows = conn
        .execute("SELECT * FROM covid WHERE COUNTY = ?", &["Kern".to_string()])
        .unwrap();
    assert!(rows.is_empty());
}

// ---------------------------------------------------------------------------
// execute_scalar / engine_version
// ---------------------------------------------------------------------------

#[test]
fn execute_scalar_returns_single_value() {
    let (conn, _tmp) = common::setup_sample_db();

    let result = conn.execute_scalar("SELECT COUNT(*) FROM covid", &[]).unwrap();
    assert_eq!(result.unwrap().as_i64().unwrap(), 7);
}

#[test]
fn execute_scalar_returns_none_for_empty_result() {
    let (conn, _tmp) = common::setup_sample_db();

    let result = conn
        .execute_scalar("SELECT CASES FROM covid WHERE COUNTY = ?", &["Kern".to_string()])
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn engine_version_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let conn = empty_connection(tmp.path());
    assert!(!conn.engine_version().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// register_table_from_ndjson / register_source
// ---------------------------------------------------------------------------

#[test]
fn register_table_replaces_existing_table() {
    let tmp = tempfile::tempdir().unwrap();
    let conn = empty_connection(tmp.path());

    let mut file1 = NamedTempFile::new().unwrap();
    writeln!(file1, r#"{{"val": "old"}}"#).unwrap();
    file1.flush().unwrap();
    conn.register_table_from_ndjson("replaceable", file1.path().to_str().unwrap())
        .unwrap();

    let mut file2 = NamedTempFile::new().unwrap();
    writeln!(file2, r#"{{"val": "new"}}"#).unwrap();
    file2.flush().unwrap();
    conn.register_table_from_ndjson("replaceable", file2.path().to_str().unwrap())
        .unwrap();

    let rows = conn.execute("SELECT * FROM replaceable", &[]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["val"], "new");
    assert!(conn.has_view("replaceable"));
}

#[test]
fn register_source_picks_reader_by_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let conn = empty_connection(tmp.path());

    let csv = tmp.path().join("mobility.csv");
    fs::write(&csv, "DATE,RETAIL\n2020-01-01,-3.5\n").unwrap();
    conn.register_source("mobility", &csv).unwrap();

    let rows = conn.execute("SELECT RETAIL FROM mobility", &[]).unwrap();
    assert_eq!(rows[0]["RETAIL"].as_f64(), Some(-3.5));

    let unknown = tmp.path().join("mobility.xlsx");
    fs::write(&unknown, "").unwrap();
    let err = conn.register_source("other", &unknown).unwrap_err();
    assert!(matches!(err, InsightsError::InvalidArgument(_)));
}

// ---------------------------------------------------------------------------
// columns / resolve_column
// ---------------------------------------------------------------------------

#[test]
fn resolve_column_ignores_case() {
    let (conn, _tmp) = common::setup_sample_db();

    assert_eq!(conn.resolve_column("covid", "CASES").unwrap(), "CASES");
    assert_eq!(conn.resolve_column("covid", "county").unwrap(), "COUNTY");
    let err = conn.resolve_column("covid", "ZIP").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Schema error: column 'ZIP' not found in 'covid'"
    );
}

#[test]
fn unconfigured_view_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let conn = empty_connection(tmp.path());
    assert!(matches!(conn.columns("covid"), Err(InsightsError::NotFound(_))));
}

// ---------------------------------------------------------------------------
// has_view / views / reset_views
// ---------------------------------------------------------------------------

#[test]
fn views_returns_all_registered_view_names() {
    let (conn, _tmp) = common::setup_sample_db();
    assert_eq!(conn.views(), vec!["cases", "covid", "mobility"]);
}

#[test]
fn reset_views_clears_registered_views() {
    let (conn, _tmp) = common::setup_sample_db();

    conn.reset_views();

    assert!(conn.views().is_empty());
    assert!(!conn.has_view("covid"));
}

// ---------------------------------------------------------------------------
// execute_into / type conversions
// ---------------------------------------------------------------------------

#[test]
fn execute_into_deserializes_rows() {
    let (conn, _tmp) = common::setup_sample_db();

    #[derive(serde::Deserialize, Debug)]
    struct CountyTotal {
        county: String,
        total: f64,
    }

    let totals: Vec<CountyTotal> = conn
        .execute_into(
            "SELECT COUNTY AS county, SUM(CASES)::DOUBLE AS total FROM covid GROUP BY COUNTY ORDER BY COUNTY",
            &[],
        )
        .unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].county, "Alameda");
    assert_eq!(totals[0].total, 100.0);
}

#[test]
fn dates_and_nulls_are_converted() {
    let (conn, _tmp) = common::setup_sample_db();

    let rows = conn
        .execute(
            "SELECT DATE '2020-03-01' AS first_date, NULL AS missing, TIMESTAMP '2020-03-01 10:30:00' AS updated",
            &[],
        )
        .unwrap();
    assert_eq!(rows[0]["first_date"], "2020-03-01");
    assert!(rows[0]["missing"].is_null());
    assert_eq!(rows[0]["updated"], "2020-03-01T10:30:00");
}

#[test]
fn query_records_keep_column_order() {
    let (conn, _tmp) = common::setup_sample_db();

    let records = conn
        .query_records("SELECT 1 AS b, 2 AS a, 3 AS c", &[])
        .unwrap();
    assert_eq!(records[0].columns().collect::<Vec<_>>(), vec!["b", "a", "c"]);
}
