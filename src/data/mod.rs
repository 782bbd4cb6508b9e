//! Data loading
//!
//! Decodes uploaded bytes into the in-memory models the chart builders read:
//! - `cell`: tagged cell values and coercion rules
//! - `dataset`: one sheet as named columns
//! - `workbook`: multi-sheet spreadsheets (calamine)
//! - `kraken`: Kraken2 reports (Polars CSV reader)
//! - `upload`: decoder dispatch by file name

pub mod cell;
pub mod dataset;
pub mod kraken;
pub mod upload;
pub mod workbook;

pub use cell::Cell;
pub use dataset::{Column, TabularDataset};
pub use kraken::{KrakenReport, TaxonRow, REPORT_COLUMNS, REPORT_SHEET};
pub use upload::Upload;
pub use workbook::Workbook;
