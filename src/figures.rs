//! Chart and table descriptions handed to the renderer
//!
//! Every builder here is total: failures become [`Placeholder`] values
//! (`Error` for bad input, `NoData` for empty results) instead of errors, so
//! the rendering side only ever draws what it receives.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::columns::{
    aggregate_stacked, build_axis_series, build_color_map, select_complete_rows, Palette,
};
use crate::data::{Cell, KrakenReport, TabularDataset, TaxonRow};
use crate::error::DashboardError;
use crate::taxonomy::{
    build_display_table, build_graph, build_sample_flow, top_taxa_proportions, GraphOptions,
    SankeyGraph, SankeyOutcome,
};

pub const PLOT_BGCOLOR: &str = "#2c2f34";
pub const PAPER_BGCOLOR: &str = "#1e1e1e";
pub const FONT_COLOR: &str = "white";
pub const LINK_COLOR: &str = "rgba(100,100,100,0.4)";
pub const PAGE_SIZE: usize = 10;

const NO_DATA: &str = "No Data to Display";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_tick_angle: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
    pub plot_bgcolor: &'static str,
    pub paper_bgcolor: &'static str,
    pub font_color: &'static str,
}

impl Layout {
    pub fn titled(title: impl Into<String>) -> Self {
        Layout {
            title: title.into(),
            x_axis_title: None,
            y_axis_title: None,
            x_tick_angle: None,
            barmode: None,
            legend_title: None,
            plot_bgcolor: PLOT_BGCOLOR,
            paper_bgcolor: PAPER_BGCOLOR,
            font_color: FONT_COLOR,
        }
    }

    fn axes(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_axis_title = Some(x.into());
        self.y_axis_title = Some(y.into());
        self
    }

    fn stacked(mut self, legend_title: &str) -> Self {
        self.barmode = Some("stack".to_string());
        self.legend_title = Some(legend_title.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    NoData,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub message: String,
}

impl Placeholder {
    pub fn no_data(message: impl Into<String>) -> Self {
        Placeholder {
            kind: PlaceholderKind::NoData,
            message: message.into(),
        }
    }

    pub fn error(err: &DashboardError) -> Self {
        tracing::warn!("Rendering error placeholder: {}", err);
        Placeholder {
            kind: PlaceholderKind::Error,
            message: format!("Error: {}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub layout: Layout,
    pub x: Vec<Cell>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_y: Option<Vec<f64>>,
    pub colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarTrace {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBarChart {
    pub layout: Layout,
    pub traces: Vec<BarTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyChart {
    pub layout: Layout,
    pub nodes: Vec<String>,
    pub node_colors: Vec<&'static str>,
    pub source: Vec<usize>,
    pub target: Vec<usize>,
    pub value: Vec<f64>,
    pub link_color: &'static str,
}

impl SankeyChart {
    fn from_graph(graph: SankeyGraph, title: &str) -> Self {
        let node_colors = (0..graph.nodes.len()).map(|i| Palette::Set2.color(i)).collect();
        SankeyChart {
            layout: Layout::titled(title),
            source: graph.sources(),
            target: graph.targets(),
            value: graph.values(),
            nodes: graph.nodes,
            node_colors,
            link_color: LINK_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Figure {
    Bar(BarChart),
    StackedBar(StackedBarChart),
    Sankey(SankeyChart),
    Placeholder(Placeholder),
}

impl Figure {
    pub fn no_data() -> Self {
        Figure::Placeholder(Placeholder::no_data(NO_DATA))
    }

    pub fn error(err: &DashboardError) -> Self {
        Figure::Placeholder(Placeholder::error(err))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Figure::Placeholder(_))
    }

    fn from_outcome(outcome: SankeyOutcome, title: &str) -> Self {
        match outcome {
            SankeyOutcome::Graph(graph) => Figure::Sankey(SankeyChart::from_graph(graph, title)),
            SankeyOutcome::Empty { reason } => Figure::Placeholder(Placeholder::no_data(reason)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Map<String, Value>>,
    pub page_size: usize,
}

impl TableView {
    pub fn from_dataset(dataset: &TabularDataset) -> Self {
        let columns = dataset
            .column_names()
            .into_iter()
            .map(|n| TableColumn {
                name: n.to_string(),
                id: n.to_string(),
            })
            .collect();

        let rows = (0..dataset.height())
            .map(|i| {
                dataset
                    .columns()
                    .iter()
                    .map(|c| (c.name.clone(), serde_json::to_value(&c.cells[i]).unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();

        TableView {
            columns,
            rows,
            page_size: PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Table {
    Data(TableView),
    Placeholder(Placeholder),
}

// ============================================================================
// Sheet charts
// ============================================================================

/// Bar chart of `y_col` against `x_col`, with error bars for coverage columns.
pub fn bar_figure(dataset: &TabularDataset, x_col: &str, y_col: &str) -> Figure {
    let series = match build_axis_series(dataset, x_col, y_col) {
        Ok(series) => series,
        Err(e) => return Figure::error(&e),
    };
    if series.is_empty() {
        return Figure::no_data();
    }

    let categories: Vec<String> = series.x.iter().map(|c| c.to_string()).collect();
    let color_map = build_color_map(&categories, Palette::Vivid);
    let colors = categories
        .iter()
        .filter_map(|c| color_map.get(c))
        .collect();

    let (title, y_title) = if series.has_error_bars() {
        ("Coverage Bar Plot with Error Bars", "Coverage (Mean ± StdDev)".to_string())
    } else {
        ("Coverage Bar Plot", y_col.to_string())
    };

    let mut layout = Layout::titled(title).axes(x_col, y_title);
    layout.x_tick_angle = Some(-45);

    Figure::Bar(BarChart {
        layout,
        x: series.x,
        y: series.y,
        error_y: series.error,
        colors,
    })
}

/// Table of the two selected columns, incomplete rows removed.
pub fn build_data_table(dataset: &TabularDataset, x_col: &str, y_col: &str) -> Table {
    let columns: Vec<&str> = if x_col == y_col { vec![x_col] } else { vec![x_col, y_col] };
    match select_complete_rows(dataset, &columns) {
        Ok(table) if table.height() == 0 => Table::Placeholder(Placeholder::no_data("No data to display")),
        Ok(table) => Table::Data(TableView::from_dataset(&table)),
        Err(e) => Table::Placeholder(Placeholder::error(&e)),
    }
}

/// One stacked trace per category, one bar per group.
pub fn stacked_figure(
    dataset: &TabularDataset,
    group_col: &str,
    category_col: &str,
    value_col: &str,
) -> Figure {
    let table = match aggregate_stacked(dataset, group_col, category_col, value_col) {
        Ok(table) => table,
        Err(e) => return Figure::error(&e),
    };
    if table.is_empty() {
        return Figure::no_data();
    }

    let traces = table
        .categories
        .iter()
        .enumerate()
        .map(|(i, category)| BarTrace {
            name: category.clone(),
            x: table.groups.clone(),
            y: table.category_series(i),
            color: None,
            hover: None,
        })
        .collect();

    let layout = Layout::titled(format!("Kraken Stacked Bar Plot for {}", dataset.name))
        .axes("Sample", "Percentage of Reads (%)")
        .stacked("Category");

    Figure::StackedBar(StackedBarChart { layout, traces })
}

pub fn sample_flow_figure(
    dataset: &TabularDataset,
    sample_col: &str,
    sample: &str,
    hierarchy: &[&str],
    value_col: &str,
) -> Figure {
    match build_sample_flow(dataset, sample_col, sample, hierarchy, value_col) {
        Ok(outcome) => Figure::from_outcome(outcome, "Taxonomic Classification Sankey"),
        Err(e) => Figure::error(&e),
    }
}

// ============================================================================
// Kraken report charts
// ============================================================================

pub fn taxonomy_sankey_figure(rows: &[TaxonRow], options: &GraphOptions) -> Figure {
    Figure::from_outcome(
        build_graph(rows, options),
        "Kraken2 Taxonomic Classification Sankey Diagram",
    )
}

/// Percentage table over the rows passing `min_reads` / `rank_filter`;
/// percentages use the unfiltered report's clade total, so the unfiltered
/// table sums to 100.
pub fn taxonomy_table(report: &KrakenReport, options: &GraphOptions) -> Table {
    let rows = report.rows().iter().filter(|r| {
        r.reads_clade >= options.min_reads
            && options.rank_filter.as_ref().map_or(true, |f| &r.rank == f)
    });
    let table = build_display_table(rows, report.clade_total());
    if table.is_empty() {
        return Table::Placeholder(Placeholder::no_data("No taxa pass the current filters"));
    }

    let dataset = TabularDataset::from_rows(
        "taxa",
        ["name", "rank", "tax_id", "reads_clade", "reads_taxon", "percentage"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        table
            .into_iter()
            .map(|r| {
                vec![
                    Cell::Text(r.name),
                    Cell::Text(r.rank.code().to_string()),
                    Cell::Number(r.tax_id as f64),
                    Cell::Number(r.reads_clade as f64),
                    Cell::Number(r.reads_taxon as f64),
                    Cell::Text(r.percentage_display),
                ]
            })
            .collect(),
    );
    Table::Data(TableView::from_dataset(&dataset))
}

pub fn top_taxa_figure(report: &KrakenReport, top_n: usize) -> Figure {
    let top = match top_taxa_proportions(report, top_n) {
        Ok(top) => top,
        Err(e) => return Figure::error(&e),
    };
    if top.is_empty() {
        return Figure::Placeholder(Placeholder::no_data("No Genus/Species-Level Data Available"));
    }

    let colors = &top.colors;
    let levels = [("Genus", "G", &top.genus), ("Species", "S", &top.species)];
    let traces = levels
        .iter()
        .flat_map(|&(label, code, shares)| {
            shares.iter().map(move |share| BarTrace {
                name: format!("{}: {}", code, share.name),
                x: vec![label.to_string()],
                y: vec![share.proportion],
                color: colors.get(&share.name),
                hover: Some(format!("{}<br>Proportion: {:.2}%", share.name, share.proportion * 100.0)),
            })
        })
        .collect();

    let layout = Layout::titled("Top Taxa - Stacked Bar Chart of Kraken2 Reads")
        .axes("Taxonomic Rank", "Proportion of Reads")
        .stacked("Taxa");

    Figure::StackedBar(StackedBarChart { layout, traces })
}
