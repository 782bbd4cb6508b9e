//! Top genus / species composition
//!
//! Sums direct reads per name at genus and species level, keeps the N largest
//! of each and expresses them as proportions of the kept total.

use polars::prelude::*;
use serde::Serialize;

use super::rank::RankCode;
use crate::columns::palette::{build_color_map, ColorMap, Palette};
use crate::data::kraken::KrakenReport;
use crate::error::Result;

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonShare {
    pub name: String,
    pub reads: u64,
    pub proportion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopTaxa {
    pub genus: Vec<TaxonShare>,
    pub species: Vec<TaxonShare>,
    /// Bold palette, genus names first then species names
    pub colors: ColorMap,
}

impl TopTaxa {
    pub fn is_empty(&self) -> bool {
        self.genus.is_empty() && self.species.is_empty()
    }
}

pub fn top_taxa_proportions(report: &KrakenReport, top_n: usize) -> Result<TopTaxa> {
    let genus = top_for_rank(report.frame(), &RankCode::Genus, top_n)?;
    let species = top_for_rank(report.frame(), &RankCode::Species, top_n)?;

    let colors = build_color_map(
        genus.iter().chain(species.iter()).map(|t| t.name.as_str()),
        Palette::Bold,
    );

    Ok(TopTaxa {
        genus,
        species,
        colors,
    })
}

fn top_for_rank(frame: &DataFrame, rank: &RankCode, top_n: usize) -> Result<Vec<TaxonShare>> {
    let top = frame
        .clone()
        .lazy()
        .filter(col("rank").eq(lit(rank.code().to_string())))
        .group_by([col("name")])
        .agg([col("reads_taxon").sum()])
        .sort(
            ["reads_taxon", "name"],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(IdxSize::try_from(top_n).unwrap_or(IdxSize::MAX))
        .collect()?;

    let names = top.column("name")?.str()?;
    let reads = top.column("reads_taxon")?.u64()?;

    let mut shares: Vec<TaxonShare> = names
        .into_iter()
        .zip(reads.into_iter())
        .filter_map(|(name, reads)| {
            Some(TaxonShare {
                name: name?.to_string(),
                reads: reads.unwrap_or(0),
                proportion: 0.0,
            })
        })
        .collect();

    let kept: u64 = shares.iter().map(|s| s.reads).sum();
    if kept > 0 {
        for share in shares.iter_mut() {
            share.proportion = share.reads as f64 / kept as f64;
        }
    }

    Ok(shares)
}
