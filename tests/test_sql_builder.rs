//! Unit tests for the SqlBuilder query construction.

use covid_insights::sql_builder::quote_ident;
use covid_insights::SqlBuilder;

// ---------------------------------------------------------------------------
// Basic construction
// ---------------------------------------------------------------------------

#[test]
fn new_creates_select_star_from_table() {
    let (sql, params) = SqlBuilder::new("covid").build();
    assert_eq!(sql, "SELECT *\nFROM covid");
    assert!(params.is_empty());
}

#[test]
fn select_replaces_default_star() {
    let (sql, _) = SqlBuilder::new("covid").select(&["DATE", "CASES"]).build();
    assert!(sql.starts_with("SELECT DATE, CASES\n"));
}

#[test]
fn quote_ident_doubles_embedded_quotes() {
    assert_eq!(quote_ident("CASES"), "\"CASES\"");
    assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
}

// ---------------------------------------------------------------------------
// WHERE conditions
// ---------------------------------------------------------------------------

#[test]
fn where_eq_adds_equality_with_param() {
    let (sql, params) = SqlBuilder::new("cases")
        .where_eq("AREA_TYPE", "County")
        .build();
    assert!(sql.contains("WHERE AREA_TYPE = ?"));
    assert_eq!(params, vec!["County"]);
}

#[test]
fn where_ne_adds_inequality_with_param() {
    let (sql, params) = SqlBuilder::new("cases").where_ne("AREA", "Unknown").build();
    assert!(sql.contains("WHERE AREA <> ?"));
    assert_eq!(params, vec!["Unknown"]);
}

#[test]
fn where_null_has_no_param() {
    let (sql, params) = SqlBuilder::new("mobility")
        .where_null("SUB_REGION_2")
        .build();
    assert!(sql.contains("WHERE SUB_REGION_2 IS NULL"));
    assert!(params.is_empty());
}

#[test]
fn where_clause_appends_params_in_order() {
    let (sql, params) = SqlBuilder::new("covid")
        .where_eq("COUNTY", "Alameda")
        .where_clause("CASES BETWEEN ? AND ?", &["1", "10"])
        .build();
    assert!(sql.contains("WHERE COUNTY = ? AND CASES BETWEEN ? AND ?"));
    assert_eq!(params, vec!["Alameda", "1", "10"]);
}

// ---------------------------------------------------------------------------
// JOIN / GROUP BY / ORDER BY / LIMIT
// ---------------------------------------------------------------------------

#[test]
fn join_follows_from() {
    let (sql, _) = SqlBuilder::new("(SELECT 1) c")
        .join("LEFT JOIN (SELECT 2) m ON c.x = m.x")
        .build();
    assert_eq!(
        sql,
        "SELECT *\nFROM (SELECT 1) c\nLEFT JOIN (SELECT 2) m ON c.x = m.x"
    );
}

#[test]
fn full_grouped_query() {
    let (sql, params) = SqlBuilder::new("covid")
        .select(&["TRY_CAST(\"DATE\" AS DATE) AS \"date\"", "SUM(\"CASES\") AS \"value\""])
        .where_eq("\"COUNTY\"", "Fresno")
        .group_by(&["TRY_CAST(\"DATE\" AS DATE)"])
        .order_by(&["TRY_CAST(\"DATE\" AS DATE) ASC"])
        .limit(30)
        .build();

    assert_eq!(
        sql,
        "SELECT TRY_CAST(\"DATE\" AS DATE) AS \"date\", SUM(\"CASES\") AS \"value\"\n\
         FROM covid\n\
         WHERE \"COUNTY\" = ?\n\
         GROUP BY TRY_CAST(\"DATE\" AS DATE)\n\
         ORDER BY TRY_CAST(\"DATE\" AS DATE) ASC\n\
         LIMIT 30"
    );
    assert_eq!(params, vec!["Fresno"]);
}

#[test]
fn group_and_order_accumulate() {
    let (sql, _) = SqlBuilder::new("covid")
        .group_by(&["a"])
        .group_by(&["b"])
        .order_by(&["a ASC"])
        .order_by(&["b DESC"])
        .build();
    assert!(sql.contains("GROUP BY a, b"));
    assert!(sql.contains("ORDER BY a ASC, b DESC"));
}
