//! Column classification
//!
//! Decides which sheet columns can feed a bar chart's Y axis:
//! - numeric: every non-missing cell coerces to a number
//! - pattern-based: at least one whole cell reads like `<mean>x_..._<stddev>x`
//!   (coverage reports write "mean x ± stddev x" this way)
//!
//! A single matching cell is enough to offer a pattern-based column. Value
//! extraction is looser than classification: it takes the first
//! `<mean>x_..._<stddev>x` run in a cell, so `12.5x_sd_3.2x (n=4)` still plots.
//! Cells that fail extraction are dropped later, never zero-filled.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::data::{Column, TabularDataset};

/// Whole-cell shape used to offer a column as a Y axis.
static MEAN_STDDEV_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d*\.?\d+x_.*\d*\.?\d+x$").expect("mean/stddev cell pattern is a valid regex")
});

/// First `<mean>x_..._<stddev>x` run anywhere in a cell; trailing notes are ignored.
static MEAN_STDDEV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<mean>\d*\.?\d+)x_.*?(?P<stddev>\d*\.?\d+)x")
        .expect("mean/stddev pattern is a valid regex")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnClassification {
    pub all: Vec<String>,
    pub numeric: Vec<String>,
    pub pattern_based: Vec<String>,
}

impl ColumnClassification {
    /// Every column can be an X axis.
    pub fn x_options(&self) -> Vec<String> {
        self.all.clone()
    }

    /// Numeric columns first, then pattern-based ones.
    pub fn y_options(&self) -> Vec<String> {
        let mut options = self.numeric.clone();
        for name in &self.pattern_based {
            if !options.contains(name) {
                options.push(name.clone());
            }
        }
        options
    }
}

pub fn classify_columns(dataset: &TabularDataset) -> ColumnClassification {
    let mut classification = ColumnClassification::default();

    for column in dataset.columns() {
        classification.all.push(column.name.clone());

        if is_numeric(column) {
            classification.numeric.push(column.name.clone());
        } else if is_pattern_based(column) {
            classification.pattern_based.push(column.name.clone());
        }
    }

    tracing::debug!(
        "Classified sheet '{}': {} columns, {} numeric, {} pattern-based",
        dataset.name,
        classification.all.len(),
        classification.numeric.len(),
        classification.pattern_based.len()
    );

    classification
}

fn is_numeric(column: &Column) -> bool {
    column
        .cells
        .iter()
        .filter(|c| !c.is_missing())
        .all(|c| c.as_number().is_some())
}

fn is_pattern_based(column: &Column) -> bool {
    column
        .cells
        .iter()
        .filter_map(|c| c.as_text())
        .any(|text| MEAN_STDDEV_CELL.is_match(text.trim()))
}

/// Parse the first `"<mean>x_..._<stddev>x"` run; no run yields `(NaN, NaN)`.
pub fn extract_mean_stddev(value: &str) -> (f64, f64) {
    let Some(caps) = MEAN_STDDEV.captures(value.trim()) else {
        return (f64::NAN, f64::NAN);
    };

    let parse = |name: &str| {
        caps.name(name)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    };

    (parse("mean"), parse("stddev"))
}

/// Row-wise extraction over a whole column.
pub fn extract_column_mean_stddev(column: &Column) -> Vec<(f64, f64)> {
    column
        .cells
        .iter()
        .map(|cell| match cell.as_text() {
            Some(text) => extract_mean_stddev(&text),
            None => (f64::NAN, f64::NAN),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;

    fn coverage_sheet() -> TabularDataset {
        TabularDataset::new(
            "Assembly",
            vec![
                ("Sample".into(), vec!["a".into(), "b".into(), "c".into()]),
                ("Length".into(), vec![Cell::Number(10.0), "20".into(), Cell::Missing]),
                (
                    "Coverage_mean".into(),
                    vec!["12.5x_foo_3.2x".into(), "n/a".into(), Cell::Missing],
                ),
                ("Notes".into(), vec!["ok".into(), "12".into(), Cell::Missing]),
            ],
        )
    }

    #[test]
    fn test_classify_columns() {
        let c = classify_columns(&coverage_sheet());
        assert_eq!(c.all, vec!["Sample", "Length", "Coverage_mean", "Notes"]);
        assert_eq!(c.numeric, vec!["Length"]);
        assert_eq!(c.pattern_based, vec!["Coverage_mean"]);
        assert_eq!(c.y_options(), vec!["Length", "Coverage_mean"]);
        assert_eq!(c.x_options().len(), 4);
    }

    #[test]
    fn test_candidates_are_subset_of_all() {
        let c = classify_columns(&coverage_sheet());
        for name in c.y_options() {
            assert!(c.all.contains(&name));
        }
        for name in &c.numeric {
            assert!(!c.pattern_based.contains(name));
        }
    }

    #[test]
    fn test_no_numeric_columns_is_not_an_error() {
        let ds = TabularDataset::new("t", vec![("Name".into(), vec!["x".into(), "y".into()])]);
        let c = classify_columns(&ds);
        assert!(c.y_options().is_empty());
        assert_eq!(c.x_options(), vec!["Name"]);
    }

    #[test]
    fn test_extract_mean_stddev() {
        assert_eq!(extract_mean_stddev("12.5x_foo_3.2x"), (12.5, 3.2));
        assert_eq!(extract_mean_stddev("40x_7x"), (40.0, 7.0));
        assert_eq!(extract_mean_stddev(" 8.25x_sd_0.5x "), (8.25, 0.5));

        let (mean, stddev) = extract_mean_stddev("not_a_match");
        assert!(mean.is_nan());
        assert!(stddev.is_nan());
    }

    #[test]
    fn test_extract_leading_dot_and_trailing_notes() {
        assert_eq!(extract_mean_stddev(".5x_sd_1x"), (0.5, 1.0));
        assert_eq!(extract_mean_stddev("12.5x_sd_3.2x (n=4)"), (12.5, 3.2));
        assert_eq!(extract_mean_stddev("depth 30x_±_4.25x"), (30.0, 4.25));
    }

    #[test]
    fn test_classification_needs_whole_cell_shape() {
        let ds = TabularDataset::new(
            "Assembly",
            vec![
                ("Leading_dot".into(), vec![".5x_sd_1x".into()]),
                ("Annotated".into(), vec!["12.5x_sd_3.2x (n=4)".into()]),
            ],
        );
        let c = classify_columns(&ds);
        assert_eq!(c.pattern_based, vec!["Leading_dot"]);
    }

    #[test]
    fn test_extract_column() {
        let ds = coverage_sheet();
        let values = extract_column_mean_stddev(ds.column("Coverage_mean").unwrap());
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], (12.5, 3.2));
        assert!(values[1].0.is_nan());
        assert!(values[2].0.is_nan());
    }
}
