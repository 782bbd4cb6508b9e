//! Projection of two sheet columns into a plottable (x, y, error) series.

use serde::Serialize;

use super::classify::extract_mean_stddev;
use crate::data::{Cell, TabularDataset};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSeries {
    pub x: Vec<Cell>,
    pub y: Vec<f64>,
    /// Per-point standard deviation, only for coverage columns
    pub error: Option<Vec<f64>>,
}

impl AxisSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn has_error_bars(&self) -> bool {
        self.error.is_some()
    }
}

/// Column names carrying both "Coverage" and "mean" hold `<mean>x_..._<stddev>x` text.
pub fn is_coverage_column(name: &str) -> bool {
    name.contains("Coverage") && name.contains("mean")
}

pub fn build_axis_series(dataset: &TabularDataset, x_col: &str, y_col: &str) -> Result<AxisSeries> {
    let x_cells = &dataset.column(x_col)?.cells;
    let y_cells = &dataset.column(y_col)?.cells;

    let mut series = AxisSeries {
        x: Vec::new(),
        y: Vec::new(),
        error: None,
    };

    if is_coverage_column(y_col) {
        let mut errors = Vec::new();
        for (x, y) in x_cells.iter().zip(y_cells) {
            let (mean, stddev) = match y.as_text() {
                Some(text) => extract_mean_stddev(&text),
                None => continue,
            };
            if mean.is_nan() {
                continue;
            }
            series.x.push(x.clone());
            series.y.push(mean);
            errors.push(stddev);
        }
        series.error = Some(errors);
    } else {
        for (x, y) in x_cells.iter().zip(y_cells) {
            if x.is_missing() {
                continue;
            }
            if let Some(value) = y.as_number() {
                series.x.push(x.clone());
                series.y.push(value);
            }
        }
    }

    tracing::debug!(
        "Axis series {} vs {}: kept {} of {} rows",
        x_col,
        y_col,
        series.len(),
        dataset.height()
    );

    Ok(series)
}

/// The selected columns with every incomplete row removed.
pub fn select_complete_rows(dataset: &TabularDataset, columns: &[&str]) -> Result<TabularDataset> {
    let selected = dataset.select(columns)?;
    let complete = selected.filter_rows(|i| {
        selected
            .columns()
            .iter()
            .all(|c| !c.cells[i].is_missing())
    });
    Ok(complete)
}
