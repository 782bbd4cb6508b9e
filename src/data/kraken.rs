//! Kraken2 report decoding
//!
//! A report is a headerless, tab-separated file with six positional columns:
//!
//! ```text
//! percentage  reads_clade  reads_taxon  rank  tax_id  name
//!  12.50      1250         30           G     561     "    Escherichia"
//! ```
//!
//! Kraken pads percentages and indents names with spaces, so every field is
//! read as text by the Polars CSV reader and parsed here after trimming.

use polars::prelude::*;
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;

use super::cell::Cell;
use super::dataset::TabularDataset;
use crate::error::{DashboardError, Result};
use crate::taxonomy::rank::RankCode;

pub const REPORT_COLUMNS: [&str; 6] = [
    "percentage",
    "reads_clade",
    "reads_taxon",
    "rank",
    "tax_id",
    "name",
];

/// Sheet name under which a report is exposed to the column explorer.
pub const REPORT_SHEET: &str = "report";

/// One row of classifier output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonRow {
    pub percentage: f64,
    /// Reads assigned to this taxon and everything beneath it
    pub reads_clade: u64,
    /// Reads assigned directly to this taxon
    pub reads_taxon: u64,
    pub rank: RankCode,
    pub tax_id: u64,
    pub name: String,
}

impl TaxonRow {
    pub fn new(name: &str, rank: RankCode, reads_clade: u64, reads_taxon: u64) -> Self {
        TaxonRow {
            percentage: 0.0,
            reads_clade,
            reads_taxon,
            rank,
            tax_id: 0,
            name: name.trim().to_string(),
        }
    }
}

/// Decoded report: typed rows plus a typed Polars frame of the same data.
#[derive(Debug, Clone)]
pub struct KrakenReport {
    rows: Vec<TaxonRow>,
    frame: DataFrame,
}

impl KrakenReport {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(DashboardError::MalformedReport {
                line: 0,
                reason: "report is empty".to_string(),
            });
        }

        let schema = Schema::from_iter(
            REPORT_COLUMNS
                .iter()
                .map(|&name| Field::new(name.into(), DataType::String)),
        );

        let raw = CsvReadOptions::default()
            .with_has_header(false)
            .with_schema(Some(Arc::new(schema)))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(b'\t')
                    .with_quote_char(None),
            )
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()?;

        let rows = parse_rows(&raw)?;
        tracing::debug!("Decoded Kraken report with {} rows", rows.len());
        Self::from_rows(rows)
    }

    pub fn from_rows(rows: Vec<TaxonRow>) -> Result<Self> {
        let frame = df!(
            "percentage" => rows.iter().map(|r| r.percentage).collect::<Vec<f64>>(),
            "reads_clade" => rows.iter().map(|r| r.reads_clade).collect::<Vec<u64>>(),
            "reads_taxon" => rows.iter().map(|r| r.reads_taxon).collect::<Vec<u64>>(),
            "rank" => rows.iter().map(|r| r.rank.code().to_string()).collect::<Vec<String>>(),
            "tax_id" => rows.iter().map(|r| r.tax_id).collect::<Vec<u64>>(),
            "name" => rows.iter().map(|r| r.name.clone()).collect::<Vec<String>>(),
        )?;

        Ok(KrakenReport { rows, frame })
    }

    pub fn rows(&self) -> &[TaxonRow] {
        &self.rows
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Total reads in the sample.
    ///
    /// Every read is assigned directly to exactly one row (unclassified reads
    /// to the `U` row), so the direct counts sum to the sample total.
    pub fn total_reads(&self) -> u64 {
        total_reads(&self.rows)
    }

    /// Denominator for the display table: clade reads summed over every row.
    pub fn clade_total(&self) -> u64 {
        clade_total(&self.rows)
    }

    /// The report as a generic sheet for the column explorer.
    pub fn to_dataset(&self) -> TabularDataset {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    Cell::Number(r.percentage),
                    Cell::Number(r.reads_clade as f64),
                    Cell::Number(r.reads_taxon as f64),
                    Cell::Text(r.rank.code().to_string()),
                    Cell::Number(r.tax_id as f64),
                    Cell::from_text(&r.name),
                ]
            })
            .collect();

        TabularDataset::from_rows(
            REPORT_SHEET,
            REPORT_COLUMNS.iter().map(|s| s.to_string()).collect(),
            rows,
        )
    }
}

pub fn total_reads(rows: &[TaxonRow]) -> u64 {
    rows.iter().map(|r| r.reads_taxon).sum()
}

pub fn clade_total(rows: &[TaxonRow]) -> u64 {
    rows.iter().map(|r| r.reads_clade).sum()
}

fn parse_rows(raw: &DataFrame) -> Result<Vec<TaxonRow>> {
    let percentage = raw.column("percentage")?.str()?;
    let reads_clade = raw.column("reads_clade")?.str()?;
    let reads_taxon = raw.column("reads_taxon")?.str()?;
    let rank = raw.column("rank")?.str()?;
    let tax_id = raw.column("tax_id")?.str()?;
    let name = raw.column("name")?.str()?;

    let mut rows = Vec::with_capacity(raw.height());
    for idx in 0..raw.height() {
        let line = idx + 1;

        let row = TaxonRow {
            percentage: parse_field(percentage.get(idx), "percentage", line)?,
            reads_clade: parse_field(reads_clade.get(idx), "reads_clade", line)?,
            reads_taxon: parse_field(reads_taxon.get(idx), "reads_taxon", line)?,
            rank: RankCode::parse(required(rank.get(idx), "rank", line)?),
            tax_id: parse_field(tax_id.get(idx), "tax_id", line)?,
            name: name.get(idx).unwrap_or_default().trim().to_string(),
        };

        if row.reads_taxon > row.reads_clade {
            return Err(DashboardError::MalformedReport {
                line,
                reason: format!(
                    "direct reads ({}) exceed clade reads ({})",
                    row.reads_taxon, row.reads_clade
                ),
            });
        }

        rows.push(row);
    }

    Ok(rows)
}

fn required<'a>(value: Option<&'a str>, field: &str, line: usize) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DashboardError::MalformedReport {
            line,
            reason: format!("missing {}", field),
        }),
    }
}

fn parse_field<T: std::str::FromStr>(value: Option<&str>, field: &str, line: usize) -> Result<T> {
    let text = required(value, field, line)?;
    text.parse::<T>().map_err(|_| DashboardError::MalformedReport {
        line,
        reason: format!("{} '{}' is not a number", field, text),
    })
}
