//! Taxonomic hierarchy views over Kraken reports
//!
//! - `rank`: rank codes, caller-supplied rank order, absent-rank policy
//! - `graph`: rank-inferred Sankey graph (the flat report has no parent pointers)
//! - `table`: percentage-annotated display rows
//! - `top_taxa`: top genus/species proportions
//! - `sample_flow`: per-sample Sankey from summary sheets with explicit hierarchy columns

pub mod graph;
pub mod rank;
pub mod sample_flow;
pub mod table;
pub mod top_taxa;

pub use graph::{
    build_graph, build_graph_with, GraphOptions, NearestLowerRankParent, NodeRegistry,
    ParentInference, ReadsOrder, SankeyGraph, SankeyLink, SankeyOutcome, WeightMode,
};
pub use rank::{AbsentRankPolicy, RankCode, RankOrder};
pub use sample_flow::{build_sample_flow, DEFAULT_HIERARCHY, DEFAULT_VALUE_COLUMN};
pub use table::{build_display_table, DisplayRow};
pub use top_taxa::{top_taxa_proportions, TaxonShare, TopTaxa, DEFAULT_TOP_N};
