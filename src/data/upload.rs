//! Upload decoding: pick a decoder from the file name.

use std::path::Path;

use super::kraken::KrakenReport;
use super::workbook::Workbook;
use crate::error::{DashboardError, Result};

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
const REPORT_EXTENSIONS: [&str; 5] = ["tsv", "txt", "tab", "kreport", "report"];

/// One decoded upload. Reports are also exposed as a one-sheet workbook so
/// the column explorer works on them unchanged.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub workbook: Workbook,
    pub report: Option<KrakenReport>,
}

impl Upload {
    pub fn from_bytes(filename: &str, bytes: &[u8]) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            let workbook = Workbook::from_bytes(bytes)?;
            if workbook.is_empty() {
                return Err(DashboardError::EmptySheet(filename.to_string()));
            }
            tracing::info!("Uploaded workbook {} ({} sheets)", filename, workbook.sheet_names().len());
            return Ok(Upload {
                filename: filename.to_string(),
                workbook,
                report: None,
            });
        }

        if REPORT_EXTENSIONS.contains(&extension.as_str()) {
            let report = KrakenReport::from_bytes(bytes)?;
            tracing::info!("Uploaded Kraken report {} ({} rows)", filename, report.rows().len());
            return Ok(Upload {
                filename: filename.to_string(),
                workbook: Workbook::from_sheets(vec![report.to_dataset()]),
                report: Some(report),
            });
        }

        Err(DashboardError::UnsupportedFormat(filename.to_string()))
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    pub fn has_report(&self) -> bool {
        self.report.is_some()
    }
}
