//! Spreadsheet workbook decoding
//!
//! Every sheet is decoded eagerly into a [`TabularDataset`] using its first row
//! as the header. Supports whatever calamine auto-detects (xlsx, xlsm, xls, ods).

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;

use super::cell::Cell;
use super::dataset::TabularDataset;
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<TabularDataset>,
}

impl Workbook {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| DashboardError::Workbook(e.to_string()))?;

        let mut sheets = Vec::new();
        for name in reader.sheet_names() {
            let range = reader
                .worksheet_range(&name)
                .map_err(|e| DashboardError::Workbook(format!("sheet '{}': {}", name, e)))?;
            let dataset = range_to_dataset(&name, &range);
            tracing::debug!(
                "Decoded sheet '{}' ({} rows x {} columns)",
                name,
                dataset.height(),
                dataset.width()
            );
            sheets.push(dataset);
        }

        Ok(Workbook { sheets })
    }

    pub fn from_sheets(sheets: Vec<TabularDataset>) -> Self {
        Workbook { sheets }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Result<&TabularDataset> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| DashboardError::UnknownSheet {
                sheet: name.to_string(),
                available: self.sheet_names(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Convert a worksheet range into a dataset, first row as header.
pub fn range_to_dataset(name: &str, range: &Range<Data>) -> TabularDataset {
    let mut rows = range.rows();

    let header: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| convert_cell(c).as_text().unwrap_or_default()).collect(),
        None => return TabularDataset::new(name, Vec::new()),
    };

    let records: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    TabularDataset::from_rows(name, header, records)
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::from_number(*f),
        Data::String(s) => Cell::from_text(s),
        Data::Empty | Data::Error(_) => Cell::Missing,
        other => Cell::Text(other.to_string()),
    }
}
