//! Per-sample Sankey from a summary sheet
//!
//! Summary sheets carry one row per (sample, taxon) with explicit hierarchy
//! columns, so no rank inference is needed: each row links
//! `sample → Genus → Species`, skipping levels whose cell is empty.

use super::graph::{NodeRegistry, SankeyGraph, SankeyLink, SankeyOutcome};
use crate::data::TabularDataset;
use crate::error::Result;

pub const DEFAULT_HIERARCHY: [&str; 2] = ["Genus", "Species"];
pub const DEFAULT_VALUE_COLUMN: &str = "Reads_(%)";

pub fn build_sample_flow(
    dataset: &TabularDataset,
    sample_col: &str,
    sample: &str,
    hierarchy: &[&str],
    value_col: &str,
) -> Result<SankeyOutcome> {
    let samples = &dataset.column(sample_col)?.cells;
    let levels: Vec<_> = hierarchy
        .iter()
        .filter_map(|name| dataset.column(name).ok())
        .collect();
    let values = dataset.column(value_col).ok();

    let mut registry = NodeRegistry::default();
    let mut links = Vec::new();
    let mut matched = 0usize;

    for row in 0..dataset.height() {
        if samples[row].as_text().as_deref().map(str::trim) != Some(sample) {
            continue;
        }
        matched += 1;

        let value = values
            .and_then(|c| c.cells[row].as_number())
            .unwrap_or(1.0);

        let mut parent = registry.get_or_insert(sample);
        for level in &levels {
            let Some(label) = level.cells[row].as_text() else {
                continue;
            };
            let current = registry.get_or_insert(label.trim());
            if current != parent {
                links.push(SankeyLink {
                    source: parent,
                    target: current,
                    value,
                });
            }
            parent = current;
        }
    }

    tracing::debug!("Sample flow for '{}': {} rows, {} links", sample, matched, links.len());

    if links.is_empty() {
        return Ok(SankeyOutcome::Empty {
            reason: format!("No hierarchy data for sample '{}'", sample),
        });
    }

    Ok(SankeyOutcome::Graph(SankeyGraph {
        nodes: registry.into_nodes(),
        links,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;

    fn summary() -> TabularDataset {
        TabularDataset::new(
            "Kraken",
            vec![
                ("Sample_name".into(), vec!["s1".into(), "s1".into(), "s2".into()]),
                ("Genus".into(), vec!["Escherichia".into(), "Salmonella".into(), "Bacillus".into()]),
                ("Species".into(), vec!["E. coli".into(), Cell::Missing, "B. subtilis".into()]),
                ("Reads_(%)".into(), vec![Cell::Number(40.0), Cell::Number(10.0), Cell::Number(5.0)]),
            ],
        )
    }

    #[test]
    fn test_sample_flow() {
        let outcome = build_sample_flow(&summary(), "Sample_name", "s1", &DEFAULT_HIERARCHY, DEFAULT_VALUE_COLUMN).unwrap();
        let graph = outcome.graph().unwrap();
        assert_eq!(graph.nodes, vec!["s1", "Escherichia", "E. coli", "Salmonella"]);
        assert_eq!(graph.sources(), vec![0, 1, 0]);
        assert_eq!(graph.targets(), vec![1, 2, 3]);
        assert_eq!(graph.values(), vec![40.0, 40.0, 10.0]);
    }

    #[test]
    fn test_value_defaults_to_one() {
        let outcome = build_sample_flow(&summary(), "Sample_name", "s2", &DEFAULT_HIERARCHY, "Reads").unwrap();
        assert_eq!(outcome.graph().unwrap().values(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_unknown_sample_is_empty() {
        let outcome = build_sample_flow(&summary(), "Sample_name", "s9", &DEFAULT_HIERARCHY, DEFAULT_VALUE_COLUMN).unwrap();
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_missing_sample_column_is_error() {
        assert!(build_sample_flow(&summary(), "Sample", "s1", &DEFAULT_HIERARCHY, DEFAULT_VALUE_COLUMN).is_err());
    }
}
