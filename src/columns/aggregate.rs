//! Grouped aggregates over sheet columns
//!
//! `aggregate_stacked` is a group-by-sum followed by a pivot: one row per
//! group, one column per category, absent combinations filled with 0. Keys are
//! sorted so repeated calls give the same layout.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::data::TabularDataset;
use crate::error::Result;

/// Default sample column in assembly summary sheets
pub const SAMPLE_COLUMN: &str = "Sample_name";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedTable {
    pub groups: Vec<String>,
    pub categories: Vec<String>,
    /// `values[g][c]` is the sum for `groups[g]` × `categories[c]`
    pub values: Vec<Vec<f64>>,
}

impl StackedTable {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() || self.categories.is_empty()
    }

    pub fn value(&self, group: &str, category: &str) -> Option<f64> {
        let g = self.groups.iter().position(|x| x == group)?;
        let c = self.categories.iter().position(|x| x == category)?;
        Some(self.values[g][c])
    }

    /// One value per group for a single category (a stacked-bar trace).
    pub fn category_series(&self, category_index: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[category_index]).collect()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().flatten().sum()
    }
}

pub fn aggregate_stacked(
    dataset: &TabularDataset,
    group_col: &str,
    category_col: &str,
    value_col: &str,
) -> Result<StackedTable> {
    let groups = &dataset.column(group_col)?.cells;
    let categories = &dataset.column(category_col)?.cells;
    let values = &dataset.column(value_col)?.cells;

    let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut group_keys = BTreeSet::new();
    let mut category_keys = BTreeSet::new();

    for ((group, category), value) in groups.iter().zip(categories).zip(values) {
        let (Some(group), Some(category)) = (group.as_text(), category.as_text()) else {
            continue;
        };
        let group = group.trim().to_string();
        let category = category.trim().to_string();

        group_keys.insert(group.clone());
        category_keys.insert(category.clone());
        *sums.entry((group, category)).or_insert(0.0) += value.as_number().unwrap_or(0.0);
    }

    let groups: Vec<String> = group_keys.into_iter().collect();
    let categories: Vec<String> = category_keys.into_iter().collect();
    let values = groups
        .iter()
        .map(|g| {
            categories
                .iter()
                .map(|c| sums.get(&(g.clone(), c.clone())).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    Ok(StackedTable {
        groups,
        categories,
        values,
    })
}

/// Distinct non-missing values of `column` in first-encounter order.
///
/// A sheet without the column simply has no samples.
pub fn sample_names(dataset: &TabularDataset, column: &str) -> Vec<String> {
    let Ok(column) = dataset.column(column) else {
        tracing::warn!(
            "Column '{}' not found in sheet '{}'. Available columns: {:?}",
            column,
            dataset.name,
            dataset.column_names()
        );
        return Vec::new();
    };

    let mut names: Vec<String> = Vec::new();
    for text in column.cells.iter().filter_map(|c| c.as_text()).map(|t| t.trim().to_string()) {
        if !names.contains(&text) {
            names.push(text);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use approx::assert_relative_eq;

    fn kraken_summary() -> TabularDataset {
        TabularDataset::new(
            "Kraken",
            vec![
                (
                    "Sample_name".into(),
                    vec!["s2".into(), "s1".into(), "s1".into(), "s2".into(), Cell::Missing, "s1".into()],
                ),
                (
                    "Species.2".into(),
                    vec!["Other".into(), "E. coli".into(), "Other".into(), "Other".into(), "E. coli".into(), "E. coli".into()],
                ),
                (
                    "Reads_(%)".into(),
                    vec![
                        Cell::Number(60.0),
                        Cell::Number(25.5),
                        Cell::Number(30.0),
                        Cell::Number(15.0),
                        Cell::Number(99.0),
                        "4.5".into(),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_pivot_fills_missing_with_zero() {
        let table = aggregate_stacked(&kraken_summary(), "Sample_name", "Species.2", "Reads_(%)").unwrap();
        assert_eq!(table.groups, vec!["s1", "s2"]);
        assert_eq!(table.categories, vec!["E. coli", "Other"]);
        assert_relative_eq!(table.value("s1", "E. coli").unwrap(), 30.0);
        assert_relative_eq!(table.value("s2", "Other").unwrap(), 75.0);
        assert_relative_eq!(table.value("s2", "E. coli").unwrap(), 0.0);
        assert_eq!(table.category_series(1), vec![30.0, 75.0]);
    }

    #[test]
    fn test_mass_conservation() {
        let ds = kraken_summary();
        let table = aggregate_stacked(&ds, "Sample_name", "Species.2", "Reads_(%)").unwrap();
        // Row with a missing group is excluded from the filtered input.
        let expected = 60.0 + 25.5 + 30.0 + 15.0 + 4.5;
        assert_relative_eq!(table.total(), expected);
    }

    #[test]
    fn test_missing_value_column_is_error() {
        let err = aggregate_stacked(&kraken_summary(), "Sample_name", "Species.2", "Reads").unwrap_err();
        assert!(err.to_string().contains("Reads"));
    }

    #[test]
    fn test_sample_names_in_encounter_order() {
        assert_eq!(sample_names(&kraken_summary(), SAMPLE_COLUMN), vec!["s2", "s1"]);
        assert!(sample_names(&kraken_summary(), "Sample").is_empty());
    }
}
