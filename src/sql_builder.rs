//! SQL builder with parameterized query construction.
//!
//! Values go through DuckDB's parameter binding (`?` placeholders). Column
//! names cannot be bound, so callers pass them through [`quote_ident`] before
//! handing them to the builder. Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use covid_insights::sql_builder::{quote_ident, SqlBuilder};
//! let date = quote_ident("DATE");
//! let (sql, params) = SqlBuilder::new("covid")
//!     .select(&[&format!("{} AS \"date\"", date), "SUM(\"CASES\") AS \"value\""])
//!     .where_eq("\"AREA_TYPE\"", "County")
//!     .group_by(&[&date])
//!     .order_by(&["\"date\" ASC"])
//!     .limit(10)
//!     .build();
//! ```

/// Quote an identifier for DuckDB, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds parameterized SQL queries.
pub struct SqlBuilder {
    select_cols: Vec<String>,
    from_table: String,
    joins: Vec<String>,
    where_clauses: Vec<String>,
    params: Vec<String>,
    group_by_cols: Vec<String>,
    order_by_cols: Vec<String>,
    limit_val: Option<usize>,
}

impl SqlBuilder {
    /// Create a builder targeting the given table, view, or subquery.
    pub fn new(table: &str) -> Self {
        Self {
            select_cols: vec!["*".to_string()],
            from_table: table.to_string(),
            joins: Vec::new(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            group_by_cols: Vec::new(),
            order_by_cols: Vec::new(),
            limit_val: None,
        }
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add a full JOIN clause, e.g. `"LEFT JOIN m ON c.month = m.month"`.
    pub fn join(&mut self, clause: &str) -> &mut Self {
        self.joins.push(clause.to_string());
        self
    }

    /// Add a WHERE condition with `?` placeholders for each param.
    pub fn where_clause(&mut self, condition: &str, params: &[&str]) -> &mut Self {
        self.where_clauses.push(condition.to_string());
        self.params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    /// Add an equality condition: `{column} = ?`.
    pub fn where_eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses.push(format!("{} = ?", column));
        self.params.push(value.to_string());
        self
    }

    /// Add an inequality condition: `{column} <> ?`.
    pub fn where_ne(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses.push(format!("{} <> ?", column));
        self.params.push(value.to_string());
        self
    }

    /// Add a `{column} IS NULL` condition.
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.where_clauses.push(format!("{} IS NULL", column));
        self
    }

    /// Add GROUP BY expressions.
    pub fn group_by(&mut self, cols: &[&str]) -> &mut Self {
        self.group_by_cols.extend(cols.iter().map(|c| c.to_string()));
        self
    }

    /// Add ORDER BY clauses (e.g. `"\"date\" ASC"`).
    pub fn order_by(&mut self, clauses: &[&str]) -> &mut Self {
        self.order_by_cols.extend(clauses.iter().map(|c| c.to_string()));
        self
    }

    /// Set the maximum number of rows to return.
    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit_val = Some(n);
        self
    }

    /// Build the final SQL string and parameter list.
    pub fn build(&self) -> (String, Vec<String>) {
        let mut parts = vec![
            format!("SELECT {}", self.select_cols.join(", ")),
            format!("FROM {}", self.from_table),
        ];

        for j in &self.joins {
            parts.push(j.clone());
        }

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if !self.group_by_cols.is_empty() {
            parts.push(format!("GROUP BY {}", self.group_by_cols.join(", ")));
        }

        if !self.order_by_cols.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
        }

        if let Some(n) = self.limit_val {
            parts.push(format!("LIMIT {}", n));
        }

        (parts.join("\n"), self.params.clone())
    }
}
