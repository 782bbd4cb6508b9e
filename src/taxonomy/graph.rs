//! Taxonomy → Sankey graph construction
//!
//! Kraken reports are flat: each row has a name, a rank code and read counts,
//! but no parent pointer. The hierarchy is reconstructed from rank depth alone:
//!
//! 1. Filter rows (min clade reads, optional single rank, no root/unclassified)
//! 2. Stable-sort by rank level (index in the [`RankOrder`]), then by reads if asked
//! 3. Walk the sorted rows, registering node names in first-encounter order
//! 4. Link each row to its inferred parent (see [`NearestLowerRankParent`])
//!
//! **Known limitation**: when several rows share the parent rank level, the one
//! sorted last wins. With no lineage data this can attach a species to a genus
//! it does not belong to. The rule is kept as-is so graphs stay reproducible.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::rank::{AbsentRankPolicy, RankCode, RankOrder};
use crate::data::kraken::{total_reads, TaxonRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

/// Node labels (unique, first-encounter order) and weighted links between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SankeyGraph {
    pub nodes: Vec<String>,
    pub links: Vec<SankeyLink>,
}

impl SankeyGraph {
    pub fn sources(&self) -> Vec<usize> {
        self.links.iter().map(|l| l.source).collect()
    }

    pub fn targets(&self) -> Vec<usize> {
        self.links.iter().map(|l| l.target).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.links.iter().map(|l| l.value).collect()
    }
}

/// Either a drawable graph or an explicit "nothing to draw".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SankeyOutcome {
    Graph(SankeyGraph),
    Empty { reason: String },
}

impl SankeyOutcome {
    pub fn graph(&self) -> Option<&SankeyGraph> {
        match self {
            SankeyOutcome::Graph(g) => Some(g),
            SankeyOutcome::Empty { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SankeyOutcome::Empty { .. })
    }
}

/// Name → node index, insertion order is node order.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl NodeRegistry {
    pub fn get_or_insert(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn into_nodes(self) -> Vec<String> {
        self.nodes
    }
}

/// How link values are derived from clade reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMode {
    /// `reads_clade`
    #[default]
    Raw,
    /// `log10(reads_clade + 1) * log_scale`
    Log,
    /// `reads_clade / total_reads * 100`
    Percentage,
}

/// Secondary sort key within a rank level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadsOrder {
    /// Keep report order
    #[default]
    Input,
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphOptions {
    pub min_reads: u64,
    pub rank_filter: Option<RankCode>,
    pub rank_order: RankOrder,
    pub absent_rank: AbsentRankPolicy,
    pub sort: ReadsOrder,
    pub weight: WeightMode,
    pub log_scale: f64,
    /// Case-insensitive substring a name must contain
    pub name_filter: Option<String>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        GraphOptions {
            min_reads: 0,
            rank_filter: None,
            rank_order: RankOrder::full(),
            absent_rank: AbsentRankPolicy::Deepest,
            sort: ReadsOrder::Input,
            weight: WeightMode::Raw,
            log_scale: 10.0,
            name_filter: None,
        }
    }
}

impl GraphOptions {
    pub fn with_rank_order(mut self, rank_order: RankOrder) -> Self {
        self.rank_order = rank_order;
        self
    }

    pub fn with_min_reads(mut self, min_reads: u64) -> Self {
        self.min_reads = min_reads;
        self
    }

    pub fn with_weight(mut self, weight: WeightMode) -> Self {
        self.weight = weight;
        self
    }

    /// Rows surviving the filter step, in report order.
    pub fn filter<'a>(&self, rows: &'a [TaxonRow]) -> Vec<&'a TaxonRow> {
        let name_filter = self.name_filter.as_ref().map(|f| f.to_lowercase());

        rows.iter()
            .filter(|r| r.reads_clade >= self.min_reads)
            .filter(|r| self.rank_filter.as_ref().map_or(true, |f| &r.rank == f))
            .filter(|r| !r.rank.is_root_marker())
            .filter(|r| {
                self.absent_rank == AbsentRankPolicy::Deepest || self.rank_order.contains(&r.rank)
            })
            .filter(|r| {
                name_filter
                    .as_ref()
                    .map_or(true, |f| r.name.to_lowercase().contains(f.as_str()))
            })
            .collect()
    }
}

/// Picks a parent for the row at `position` among rows sorted by rank level.
pub trait ParentInference {
    /// `levels` is non-decreasing; returns the parent's position, if any.
    fn parent_position(&self, levels: &[usize], position: usize) -> Option<usize>;
}

/// Parent = the row sorted last among rows with a strictly lower rank level.
///
/// Because rows are sorted by level, those rows are exactly the prefix before
/// the first row at the current level, so a binary search finds the boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestLowerRankParent;

impl ParentInference for NearestLowerRankParent {
    fn parent_position(&self, levels: &[usize], position: usize) -> Option<usize> {
        let level = levels[position];
        levels.partition_point(|&l| l < level).checked_sub(1)
    }
}

pub fn build_graph(rows: &[TaxonRow], options: &GraphOptions) -> SankeyOutcome {
    build_graph_with(rows, options, &NearestLowerRankParent)
}

pub fn build_graph_with<P: ParentInference>(
    rows: &[TaxonRow],
    options: &GraphOptions,
    strategy: &P,
) -> SankeyOutcome {
    let total = total_reads(rows);

    let mut ranked: Vec<(usize, &TaxonRow)> = options
        .filter(rows)
        .into_iter()
        .map(|r| (options.rank_order.level(&r.rank), r))
        .collect();

    if ranked.is_empty() {
        return SankeyOutcome::Empty {
            reason: format!("No taxa with at least {} clade reads", options.min_reads),
        };
    }

    match options.sort {
        ReadsOrder::Input => ranked.sort_by_key(|(level, _)| *level),
        ReadsOrder::Ascending => ranked.sort_by_key(|(level, r)| (*level, r.reads_clade)),
        ReadsOrder::Descending => ranked.sort_by_key(|(level, r)| (*level, Reverse(r.reads_clade))),
    }

    let levels: Vec<usize> = ranked.iter().map(|(level, _)| *level).collect();
    let mut registry = NodeRegistry::default();
    let mut links = Vec::new();

    for (position, (_, row)) in ranked.iter().enumerate() {
        let target = registry.get_or_insert(&row.name);

        let Some(parent_pos) = strategy.parent_position(&levels, position) else {
            continue;
        };
        let parent_name = &ranked[parent_pos].1.name;
        let Some(source) = registry.get(parent_name) else {
            continue;
        };
        if source == target {
            tracing::debug!("Skipping self-link for '{}'", row.name);
            continue;
        }

        links.push(SankeyLink {
            source,
            target,
            value: link_weight(row.reads_clade, total, options),
        });
    }

    if links.is_empty() {
        return SankeyOutcome::Empty {
            reason: "No parent/child links: fewer than two rank levels remain".to_string(),
        };
    }

    let graph = SankeyGraph {
        nodes: registry.into_nodes(),
        links,
    };
    debug_assert!(graph
        .links
        .iter()
        .all(|l| l.source < graph.nodes.len() && l.target < graph.nodes.len()));

    tracing::debug!(
        "Built taxonomy graph: {} nodes, {} links from {} rows",
        graph.nodes.len(),
        graph.links.len(),
        rows.len()
    );

    SankeyOutcome::Graph(graph)
}

fn link_weight(reads_clade: u64, total_reads: u64, options: &GraphOptions) -> f64 {
    match options.weight {
        WeightMode::Raw => reads_clade as f64,
        WeightMode::Log => libm::log10(reads_clade as f64 + 1.0) * options.log_scale,
        WeightMode::Percentage if total_reads == 0 => 0.0,
        WeightMode::Percentage => reads_clade as f64 / total_reads as f64 * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(name: &str, rank: &str, clade: u64) -> TaxonRow {
        TaxonRow::new(name, RankCode::parse(rank), clade, 0)
    }

    fn genus_species() -> GraphOptions {
        GraphOptions::default().with_rank_order("G,S".parse().unwrap())
    }

    #[test]
    fn test_species_link_to_single_genus() {
        let rows = vec![row("Bac", "G", 100), row("Sp1", "S", 40), row("Sp2", "S", 30)];
        let outcome = build_graph(&rows, &genus_species());
        let graph = outcome.graph().expect("graph");

        assert_eq!(graph.nodes, vec!["Bac", "Sp1", "Sp2"]);
        assert_eq!(
            graph.links,
            vec![
                SankeyLink { source: 0, target: 1, value: 40.0 },
                SankeyLink { source: 0, target: 2, value: 30.0 },
            ]
        );
    }

    #[test]
    fn test_min_reads_above_everything_is_empty() {
        let rows = vec![row("Bac", "G", 100), row("Sp1", "S", 40)];
        let outcome = build_graph(&rows, &genus_species().with_min_reads(1_000));
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_single_rank_level_is_empty() {
        let rows = vec![row("Bac", "G", 100), row("Sp1", "S", 40)];
        let options = GraphOptions {
            rank_filter: Some(RankCode::Species),
            ..genus_species()
        };
        assert!(build_graph(&rows, &options).is_empty());
    }

    #[test]
    fn test_root_markers_excluded() {
        let rows = vec![
            row("unclassified", "U", 10),
            row("root", "R", 90),
            row("Bacteria", "D", 90),
            row("Proteobacteria", "P", 60),
        ];
        let graph = build_graph(&rows, &GraphOptions::default()).graph().cloned().unwrap();
        assert_eq!(graph.nodes, vec!["Bacteria", "Proteobacteria"]);
        assert_eq!(graph.links.len(), 1);
    }

    #[test]
    fn test_parent_is_last_row_of_lower_levels() {
        // G2 sorts after G1, so every species attaches to G2.
        let rows = vec![
            row("G1", "G", 50),
            row("Sp1", "S", 20),
            row("G2", "G", 40),
            row("Sp2", "S", 10),
        ];
        let graph = build_graph(&rows, &genus_species()).graph().cloned().unwrap();
        assert_eq!(graph.nodes, vec!["G1", "G2", "Sp1", "Sp2"]);
        assert!(graph.links.iter().all(|l| l.source == 1));
    }

    #[test]
    fn test_parent_skips_empty_levels() {
        let rows = vec![row("Bacteria", "D", 100), row("E. coli", "S", 40)];
        let graph = build_graph(&rows, &GraphOptions::default()).graph().cloned().unwrap();
        assert_eq!(graph.links, vec![SankeyLink { source: 0, target: 1, value: 40.0 }]);
    }

    #[test]
    fn test_absent_rank_policy() {
        let rows = vec![row("Bac", "G", 100), row("Sp1", "S", 40), row("strain", "S1", 5)];

        let deepest = build_graph(&rows, &genus_species()).graph().cloned().unwrap();
        assert_eq!(deepest.nodes, vec!["Bac", "Sp1", "strain"]);
        assert_eq!(deepest.links.last().unwrap().source, 1);

        let options = GraphOptions {
            absent_rank: AbsentRankPolicy::Exclude,
            ..genus_species()
        };
        let excluded = build_graph(&rows, &options).graph().cloned().unwrap();
        assert_eq!(excluded.nodes, vec!["Bac", "Sp1"]);
    }

    #[test]
    fn test_descending_sort_changes_node_order() {
        let rows = vec![row("Bac", "G", 100), row("Sp1", "S", 30), row("Sp2", "S", 40)];
        let options = GraphOptions {
            sort: ReadsOrder::Descending,
            ..genus_species()
        };
        let graph = build_graph(&rows, &options).graph().cloned().unwrap();
        assert_eq!(graph.nodes, vec!["Bac", "Sp2", "Sp1"]);
    }

    #[test]
    fn test_weight_modes() {
        let mut rows = vec![row("Bac", "G", 100), row("Sp1", "S", 99)];
        rows[0].reads_taxon = 1;
        rows[1].reads_taxon = 99;

        let pct = build_graph(&rows, &genus_species().with_weight(WeightMode::Percentage));
        assert_relative_eq!(pct.graph().unwrap().links[0].value, 99.0);

        let log = build_graph(&rows, &genus_species().with_weight(WeightMode::Log));
        assert_relative_eq!(log.graph().unwrap().links[0].value, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_names_do_not_self_link() {
        let rows = vec![row("Bacillus", "G", 100), row("Bacillus", "S", 40)];
        assert!(build_graph(&rows, &genus_species()).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            row("Bacteria", "D", 500),
            row("Firmicutes", "P", 300),
            row("Bacillus", "G", 200),
            row("B. subtilis", "S", 150),
            row("Proteobacteria", "P", 150),
        ];
        let a = build_graph(&rows, &GraphOptions::default());
        let b = build_graph(&rows, &GraphOptions::default());
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_indices_always_valid() {
        let rows = vec![
            row("Bacteria", "D", 500),
            row("Firmicutes", "P", 300),
            row("x", "S2", 3),
            row("Bacillus", "G", 200),
        ];
        let graph = build_graph(&rows, &GraphOptions::default()).graph().cloned().unwrap();
        for link in &graph.links {
            assert!(link.source < graph.nodes.len());
            assert!(link.target < graph.nodes.len());
            assert!(link.value >= 0.0);
        }
    }

    #[test]
    fn test_nearest_lower_rank_parent() {
        let strategy = NearestLowerRankParent;
        let levels = [0, 0, 2, 2, 5];
        assert_eq!(strategy.parent_position(&levels, 0), None);
        assert_eq!(strategy.parent_position(&levels, 1), None);
        assert_eq!(strategy.parent_position(&levels, 2), Some(1));
        assert_eq!(strategy.parent_position(&levels, 3), Some(1));
        assert_eq!(strategy.parent_position(&levels, 4), Some(3));
    }
}
