//! Column classification and aggregation for sheet bar charts
//!
//! - `classify`: numeric / pattern-based column detection, mean±stddev extraction
//! - `series`: (x, y, error) projection of two columns
//! - `palette`: qualitative palettes and category colour maps
//! - `aggregate`: group-by-sum pivots for stacked proportion charts

pub mod aggregate;
pub mod classify;
pub mod palette;
pub mod series;

pub use aggregate::{aggregate_stacked, sample_names, StackedTable, SAMPLE_COLUMN};
pub use classify::{
    classify_columns, extract_column_mean_stddev, extract_mean_stddev, ColumnClassification,
};
pub use palette::{build_color_map, ColorMap, Palette};
pub use series::{build_axis_series, is_coverage_column, select_complete_rows, AxisSeries};
