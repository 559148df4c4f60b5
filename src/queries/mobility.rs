//! Monthly case totals, monthly mobility averages, and their left join.

use crate::config::{MobilityConfig, CASES_VIEW, MOBILITY_VIEW};
use crate::connection::Connection;
use crate::error::Result;
use crate::models::{MobilityFactor, MobilityRow, MonthlyValue, Record};
use crate::normalize::{self, JsonRow};
use crate::sql_builder::{quote_ident, SqlBuilder};

// ---------------------------------------------------------------------------
// MobilityQuery
// ---------------------------------------------------------------------------

/// Query interface over the county `cases` and `mobility` report views.
pub struct MobilityQuery<'a> {
    conn: &'a Connection,
    config: &'a MobilityConfig,
}

impl<'a> MobilityQuery<'a> {
    pub fn new(conn: &'a Connection, config: &'a MobilityConfig) -> Self {
        Self { conn, config }
    }

    /// SQL summing county-level cases per calendar month.
    ///
    /// Output columns: `MONTH`, `MONTHLY_CASES`.
    pub fn monthly_cases_sql(&self) -> Result<(String, Vec<String>)> {
        let cfg = self.config;
        let date = self.column(CASES_VIEW, &cfg.date_column)?;
        let cases = self.column(CASES_VIEW, &cfg.cases_column)?;
        let area_type = self.column(CASES_VIEW, &cfg.area_type_column)?;
        let area = self.column(CASES_VIEW, &cfg.area_column)?;

        let month = month_expr(&date);
        let (sql, params) = SqlBuilder::new(CASES_VIEW)
            .select(&[
                &format!("{} AS \"MONTH\"", month),
                &format!("SUM(TRY_CAST({} AS DOUBLE)) AS \"MONTHLY_CASES\"", cases),
            ])
            .where_eq(&area_type, &cfg.area_type)
            .where_ne(&area, &cfg.excluded_area)
            .group_by(&[&month])
            .order_by(&[&format!("{} ASC", month)])
            .build();
        Ok((sql, params))
    }

    /// SQL averaging the mobility change-percent columns per calendar month
    /// for the configured country and province (state-level rows only).
    ///
    /// Output columns: `MONTH`, `RETAIL`, `WORKPLACES`, `RESIDENTIAL`.
    pub fn monthly_mobility_sql(&self) -> Result<(String, Vec<String>)> {
        let cfg = self.config;
        let date = self.column(MOBILITY_VIEW, &cfg.date_column)?;
        let country = self.column(MOBILITY_VIEW, &cfg.country_column)?;
        let province = self.column(MOBILITY_VIEW, &cfg.province_column)?;
        let sub_region = self.column(MOBILITY_VIEW, &cfg.sub_region_column)?;

        let mut select = vec![format!("{} AS \"MONTH\"", month_expr(&date))];
        for (factor, source) in [
            (MobilityFactor::Retail, &cfg.retail_column),
            (MobilityFactor::Workplaces, &cfg.workplaces_column),
            (MobilityFactor::Residential, &cfg.residential_column),
        ] {
            let col = self.column(MOBILITY_VIEW, source)?;
            select.push(format!(
                "AVG(TRY_CAST({} AS DOUBLE)) AS {}",
                col,
                quote_ident(factor.column())
            ));
        }
        let select: Vec<&str> = select.iter().map(String::as_str).collect();

        let month = month_expr(&date);
        let (sql, params) = SqlBuilder::new(MOBILITY_VIEW)
            .select(&select)
            .where_eq(&country, &cfg.country)
            .where_eq(&province, &cfg.province)
            .where_null(&sub_region)
            .group_by(&[&month])
            .order_by(&[&format!("{} ASC", month)])
            .build();
        Ok((sql, params))
    }

    /// Monthly case totals, ascending by month.
    pub fn monthly_cases(&self) -> Result<Vec<MonthlyValue>> {
        let (sql, params) = self.monthly_cases_sql()?;
        let records = self.conn.query_records(&sql, &params)?;
        Ok(records
            .iter()
            .filter_map(|r| {
                let month = r.get("MONTH")?.as_date()?;
                let value = r.get("MONTHLY_CASES")?.as_f64()?;
                Some(MonthlyValue { month, value })
            })
            .collect())
    }

    /// Monthly mobility averages, ascending by month.
    pub fn monthly_mobility(&self) -> Result<Vec<MobilityRow>> {
        let (sql, params) = self.monthly_mobility_sql()?;
        let records = self.conn.query_records(&sql, &params)?;
        Ok(records.iter().filter_map(MobilityRow::from_record).collect())
    }

    /// Monthly cases left-joined with monthly mobility, ordered by month.
    ///
    /// Columns: `MONTH`, `MONTHLY_CASES`, `RETAIL`, `WORKPLACES`, `RESIDENTIAL`.
    pub fn joined_records(&self) -> Result<Vec<Record>> {
        let (cases_sql, cases_params) = self.monthly_cases_sql()?;
        let (mobility_sql, mobility_params) = self.monthly_mobility_sql()?;

        let (sql, _) = SqlBuilder::new(&format!("({}) c", cases_sql))
            .select(&[
                "c.\"MONTH\" AS \"MONTH\"",
                "c.\"MONTHLY_CASES\" AS \"MONTHLY_CASES\"",
                "m.\"RETAIL\" AS \"RETAIL\"",
                "m.\"WORKPLACES\" AS \"WORKPLACES\"",
                "m.\"RESIDENTIAL\" AS \"RESIDENTIAL\"",
            ])
            .join(&format!("LEFT JOIN ({}) m ON c.\"MONTH\" = m.\"MONTH\"", mobility_sql))
            .order_by(&["c.\"MONTH\" ASC"])
            .build();

        // Placeholders appear in FROM before JOIN.
        let params: Vec<String> = cases_params.into_iter().chain(mobility_params).collect();
        self.conn.query_records(&sql, &params)
    }

    /// [`joined_records`](Self::joined_records), normalized for transport.
    pub fn joined(&self) -> Result<Vec<JsonRow>> {
        Ok(normalize::normalize(self.joined_records()?))
    }

    fn column(&self, view: &str, name: &str) -> Result<String> {
        Ok(quote_ident(&self.conn.resolve_column(view, name)?))
    }
}

fn month_expr(date_col: &str) -> String {
    format!("CAST(date_trunc('month', TRY_CAST({} AS DATE)) AS DATE)", date_col)
}
