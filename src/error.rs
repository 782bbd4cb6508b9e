//! Error types shared by the loaders and the chart builders.
//!
//! Library functions return [`DashboardError`]; the figure layer turns any of
//! them into an error placeholder so the renderer never sees a fault.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("column '{column}' not found (available: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("sheet '{sheet}' not found (available: {available:?})")]
    UnknownSheet {
        sheet: String,
        available: Vec<String>,
    },

    #[error("sheet '{0}' is empty")]
    EmptySheet(String),

    #[error("malformed report at line {line}: {reason}")]
    MalformedReport { line: usize, reason: String },

    #[error("failed to read workbook: {0}")]
    Workbook(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("invalid rank order '{0}'")]
    InvalidRankOrder(String),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
}

impl DashboardError {
    pub fn missing_column(column: &str, available: &[&str]) -> Self {
        DashboardError::MissingColumn {
            column: column.to_string(),
            available: available.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// True for errors caused by the uploaded content rather than by the caller.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            DashboardError::EmptySheet(_)
                | DashboardError::MalformedReport { .. }
                | DashboardError::Workbook(_)
                | DashboardError::UnsupportedFormat(_)
                | DashboardError::Polars(_)
        )
    }
}
