//! Taxa Dashboard
//!
//! Data core for a sequencing-results dashboard: uploaded spreadsheets and
//! Kraken2 reports in, chart and table descriptions out.
//!
//! - `data/`: cells, tabular sheets, workbook and Kraken report decoding
//! - `columns/`: column classification, axis series, palettes, stacked aggregation
//! - `taxonomy/`: rank-inferred Sankey graphs, display tables, top taxa
//! - `figures`: renderer-facing figures with no-data / error placeholders
//! - `config`: environment and query-string configuration
//! - `session`, `api_server`: session-scoped HTTP surface (feature `api`)

pub mod columns;
pub mod config;
pub mod data;
pub mod error;
pub mod figures;
pub mod taxonomy;

#[cfg(feature = "api")]
pub mod session;

pub mod api_server;

// Re-export commonly used types
pub use columns::{
    aggregate_stacked, build_axis_series, build_color_map, classify_columns, extract_mean_stddev,
    AxisSeries, ColorMap, ColumnClassification, Palette, StackedTable,
};
pub use config::{GraphQuery, ServerConfig};
pub use data::{Cell, KrakenReport, TabularDataset, TaxonRow, Upload, Workbook};
pub use error::{DashboardError, Result};
pub use figures::{Figure, Placeholder, PlaceholderKind, Table, TableView};
pub use taxonomy::{
    build_display_table, build_graph, DisplayRow, GraphOptions, RankCode, RankOrder, SankeyGraph,
    SankeyOutcome,
};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
#[cfg(feature = "api")]
pub use session::SessionStore;
