//! Tabular dataset model
//!
//! A `TabularDataset` is one decoded sheet: ordered, named columns of [`Cell`]s.
//! It is immutable once built; filters produce a new dataset.

use serde::Serialize;

use super::cell::Cell;
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularDataset {
    pub name: String,
    columns: Vec<Column>,
    height: usize,
}

impl TabularDataset {
    /// Build a dataset from `(header, cells)` pairs.
    ///
    /// Headers are trimmed, and repeated headers get spreadsheet-reader style
    /// suffixes (`Species`, `Species.1`, `Species.2`) so names stay unique keys.
    /// Short columns are padded with `Missing`.
    pub fn new(name: impl Into<String>, columns: Vec<(String, Vec<Cell>)>) -> Self {
        let height = columns.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
        let names = dedupe_headers(columns.iter().map(|(h, _)| h.as_str()));

        let columns = columns
            .into_iter()
            .zip(names)
            .map(|((_, mut cells), name)| {
                cells.resize(height, Cell::Missing);
                Column { name, cells }
            })
            .collect();

        TabularDataset {
            name: name.into(),
            columns,
            height,
        }
    }

    /// Build a dataset from a header row and row-major records.
    pub fn from_rows(name: impl Into<String>, header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut columns: Vec<(String, Vec<Cell>)> = header
            .into_iter()
            .map(|h| (h, Vec::with_capacity(rows.len())))
            .collect();

        for row in rows {
            let mut row = row.into_iter();
            for (_, cells) in columns.iter_mut() {
                cells.push(row.next().unwrap_or(Cell::Missing));
            }
        }

        Self::new(name, columns)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.height == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Look up a column by (trimmed) name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.find(name)
            .ok_or_else(|| DashboardError::missing_column(name.trim(), &self.column_names()))
    }

    fn find(&self, name: &str) -> Option<&Column> {
        let name = name.trim();
        self.columns.iter().find(|c| c.name == name)
    }

    /// New dataset keeping only the rows for which `keep(row_index)` is true.
    pub fn filter_rows<F>(&self, mut keep: F) -> TabularDataset
    where
        F: FnMut(usize) -> bool,
    {
        let kept: Vec<usize> = (0..self.height).filter(|&i| keep(i)).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                cells: kept.iter().map(|&i| c.cells[i].clone()).collect(),
            })
            .collect();

        TabularDataset {
            name: self.name.clone(),
            columns,
            height: kept.len(),
        }
    }

    /// New dataset restricted to the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<TabularDataset> {
        let columns = names
            .iter()
            .map(|n| self.column(n).cloned())
            .collect::<Result<Vec<_>>>()?;

        Ok(TabularDataset {
            name: self.name.clone(),
            columns,
            height: self.height,
        })
    }
}

fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();

    for (idx, raw) in headers.enumerate() {
        let base = match raw.trim() {
            "" => format!("Unnamed: {}", idx),
            trimmed => trimmed.to_string(),
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.push(candidate.clone());
        out.push(candidate);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TabularDataset {
        TabularDataset::new(
            "Summary",
            vec![
                (" Sample_name ".to_string(), vec!["s1".into(), "s2".into(), "s3".into()]),
                ("Species".to_string(), vec!["a".into(), Cell::Missing]),
                ("Species".to_string(), vec!["b".into(), "c".into(), "d".into()]),
                ("Species".to_string(), vec![Cell::Number(1.0)]),
            ],
        )
    }

    #[test]
    fn test_header_normalization() {
        let ds = sample();
        assert_eq!(ds.column_names(), vec!["Sample_name", "Species", "Species.1", "Species.2"]);
        assert!(ds.has_column("  Sample_name"));
    }

    #[test]
    fn test_short_columns_are_padded() {
        let ds = sample();
        assert_eq!(ds.height(), 3);
        let species = ds.column("Species").unwrap();
        assert_eq!(species.cells.len(), 3);
        assert_eq!(species.cells[2], Cell::Missing);
    }

    #[test]
    fn test_missing_column_lists_available() {
        let err = sample().column("Genus").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Genus"));
        assert!(msg.contains("Sample_name"));
    }

    #[test]
    fn test_filter_rows_builds_new_view() {
        let ds = sample();
        let filtered = ds.filter_rows(|i| i != 1);
        assert_eq!(filtered.height(), 2);
        assert_eq!(ds.height(), 3);
        assert_eq!(
            filtered.column("Sample_name").unwrap().cells,
            vec![Cell::Text("s1".into()), Cell::Text("s3".into())]
        );
    }

    #[test]
    fn test_from_rows_pads_ragged_records() {
        let ds = TabularDataset::from_rows(
            "t",
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Number(1.0)], vec![Cell::Number(2.0), "x".into()]],
        );
        assert_eq!(ds.column("b").unwrap().cells, vec![Cell::Missing, Cell::Text("x".into())]);
    }
}
