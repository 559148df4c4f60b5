#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error("Schema error: column '{column}' not found in '{table}'")]
    Schema { table: String, column: String },

    #[error("Invalid value in column '{column}': '{value}'")]
    InvalidValue { column: String, value: String },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl InsightsError {
    /// Build a schema error for a column missing from a table.
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::Schema {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

impl From<reqwest::Error> for InsightsError {
    fn from(e: reqwest::Error) -> Self {
        Self::UpstreamUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;
