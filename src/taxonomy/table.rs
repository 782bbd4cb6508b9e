//! Display table for classifier rows
//!
//! Percentages are computed against the caller's total. Passing the clade
//! reads summed over the unfiltered report ([`clade_total`]) makes the
//! percentage column add up to 100, and filtering never inflates it.
//!
//! [`clade_total`]: crate::data::kraken::clade_total

use serde::Serialize;

use super::rank::RankCode;
use crate::data::kraken::TaxonRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub name: String,
    pub rank: RankCode,
    pub tax_id: u64,
    pub reads_clade: u64,
    pub reads_taxon: u64,
    /// `reads_clade / total * 100`
    pub percentage: f64,
    /// `percentage` rounded to two decimals for display
    pub percentage_display: String,
}

/// Annotate rows with percentages and sort them by clade reads (desc), then
/// name, then tax ID, so pagination is stable.
pub fn build_display_table<'a, I>(rows: I, total_reads: u64) -> Vec<DisplayRow>
where
    I: IntoIterator<Item = &'a TaxonRow>,
{
    let pct = |reads: u64| {
        if total_reads == 0 {
            0.0
        } else {
            reads as f64 / total_reads as f64 * 100.0
        }
    };

    let mut table: Vec<DisplayRow> = rows
        .into_iter()
        .map(|r| {
            let percentage = pct(r.reads_clade);
            DisplayRow {
                name: r.name.clone(),
                rank: r.rank.clone(),
                tax_id: r.tax_id,
                reads_clade: r.reads_clade,
                reads_taxon: r.reads_taxon,
                percentage,
                percentage_display: format!("{:.2}", percentage),
            }
        })
        .collect();

    table.sort_by(|a, b| {
        b.reads_clade
            .cmp(&a.reads_clade)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.tax_id.cmp(&b.tax_id))
    });

    table
}
