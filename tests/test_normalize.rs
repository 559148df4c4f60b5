//! Result normalizer tests.

mod common;

use common::date;
use covid_insights::models::{Field, Record};
use covid_insights::normalize::{is_date_marker, normalize, normalize_record};
use serde_json::{json, Value};

#[test]
fn non_finite_floats_become_null() {
    let row = normalize_record(
        Record::new()
            .with("A", f64::NAN)
            .with("B", f64::INFINITY)
            .with("C", f64::NEG_INFINITY)
            .with("D", 1.5),
    );
    assert_eq!(row["A"], Value::Null);
    assert_eq!(row["B"], Value::Null);
    assert_eq!(row["C"], Value::Null);
    assert_eq!(row["D"], json!(1.5));
}

#[test]
fn month_and_date_markers_render_as_iso_dates() {
    let ts = date(2020, 4, 1).and_hms_opt(13, 45, 0).unwrap();
    let row = normalize_record(
        Record::new()
            .with("MONTH", date(2020, 3, 1))
            .with("report_date", Field::Timestamp(ts))
            .with("Date", "2020-05-17T08:00:00"),
    );
    assert_eq!(row["MONTH"], "2020-03-01");
    assert_eq!(row["report_date"], "2020-04-01");
    assert_eq!(row["Date"], "2020-05-17");
}

#[test]
fn non_marker_timestamp_keeps_time_of_day() {
    let ts = date(2020, 4, 1).and_hms_opt(13, 45, 0).unwrap();
    let row = normalize_record(Record::new().with("updated", Field::Timestamp(ts)));
    assert_eq!(row["updated"], "2020-04-01T13:45:00");
}

#[test]
fn unparseable_marker_text_passes_through() {
    let row = normalize_record(Record::new().with("MONTH", "sometime in spring"));
    assert_eq!(row["MONTH"], "sometime in spring");
}

#[test]
fn other_fields_are_unchanged() {
    let row = normalize_record(
        Record::new()
            .with("COUNTY", "Alameda")
            .with("CASES", 12i64)
            .with("FLAG", Field::Bool(true))
            .with("MISSING", Field::Null),
    );
    assert_eq!(row["COUNTY"], "Alameda");
    assert_eq!(row["CASES"], 12);
    assert_eq!(row["FLAG"], true);
    assert_eq!(row["MISSING"], Value::Null);
}

#[test]
fn normalize_keeps_row_count() {
    let records = vec![
        Record::new().with("value", f64::NAN),
        Record::new().with("value", 2.0),
    ];
    let rows = normalize(records);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["value"], Value::Null);
    assert_eq!(rows[1]["value"], json!(2.0));
}

#[test]
fn date_marker_detection() {
    assert!(is_date_marker("MONTH"));
    assert!(is_date_marker("first_date"));
    assert!(is_date_marker("Date"));
    assert!(!is_date_marker("MONTHLY_CASES"));
    assert!(!is_date_marker("dated_by"));
}

#[test]
fn query_results_are_normalized() {
    let (conn, _tmp) = common::setup_sample_db();
    let rows = conn
        .execute(
            "SELECT \"DATE\", 'NaN'::DOUBLE AS ratio FROM covid ORDER BY \"DATE\" LIMIT 1",
            &[],
        )
        .unwrap();
    assert_eq!(rows[0]["DATE"], "2020-03-01");
    assert_eq!(rows[0]["ratio"], Value::Null);
}
