//! Rank codes and rank ordering
//!
//! Kraken reports mark every row with a one-letter rank code (`D`, `K`, `P`,
//! `C`, `O`, `F`, `G`, `S`), plus `U` for unclassified reads and `R` for the
//! root. Intermediate ranks carry a numeric suffix (`S1`, `G2`, `R1`); those
//! are kept verbatim as [`RankCode::Other`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RankCode {
    Unclassified,
    Root,
    Domain,
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Other(String),
}

impl RankCode {
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "U" => RankCode::Unclassified,
            "R" => RankCode::Root,
            "D" => RankCode::Domain,
            "K" => RankCode::Kingdom,
            "P" => RankCode::Phylum,
            "C" => RankCode::Class,
            "O" => RankCode::Order,
            "F" => RankCode::Family,
            "G" => RankCode::Genus,
            "S" => RankCode::Species,
            other => RankCode::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            RankCode::Unclassified => "U",
            RankCode::Root => "R",
            RankCode::Domain => "D",
            RankCode::Kingdom => "K",
            RankCode::Phylum => "P",
            RankCode::Class => "C",
            RankCode::Order => "O",
            RankCode::Family => "F",
            RankCode::Genus => "G",
            RankCode::Species => "S",
            RankCode::Other(s) => s,
        }
    }

    /// Unclassified and root rows never take part in a hierarchy.
    pub fn is_root_marker(&self) -> bool {
        matches!(self, RankCode::Unclassified | RankCode::Root)
    }
}

impl fmt::Display for RankCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for RankCode {
    fn from(value: String) -> Self {
        RankCode::parse(&value)
    }
}

impl From<RankCode> for String {
    fn from(value: RankCode) -> Self {
        value.code().to_string()
    }
}

/// What to do with rows whose rank is not listed in the [`RankOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentRankPolicy {
    /// Sort after every listed rank.
    #[default]
    Deepest,
    /// Drop the row before graph construction.
    Exclude,
}

/// Caller-supplied hierarchy depth, shallowest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankOrder(Vec<RankCode>);

impl RankOrder {
    pub fn new(ranks: Vec<RankCode>) -> Result<Self, DashboardError> {
        if ranks.is_empty() {
            return Err(DashboardError::InvalidRankOrder(String::new()));
        }
        for (i, rank) in ranks.iter().enumerate() {
            if ranks[..i].contains(rank) {
                return Err(DashboardError::InvalidRankOrder(format!("duplicate rank {}", rank)));
            }
        }
        Ok(RankOrder(ranks))
    }

    /// Full Domain → Species hierarchy.
    pub fn full() -> Self {
        RankOrder(vec![
            RankCode::Domain,
            RankCode::Kingdom,
            RankCode::Phylum,
            RankCode::Class,
            RankCode::Order,
            RankCode::Family,
            RankCode::Genus,
            RankCode::Species,
        ])
    }

    /// Index of `rank` in the order, or `len()` when absent.
    pub fn level(&self, rank: &RankCode) -> usize {
        self.0.iter().position(|r| r == rank).unwrap_or(self.0.len())
    }

    pub fn contains(&self, rank: &RankCode) -> bool {
        self.0.contains(rank)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ranks(&self) -> &[RankCode] {
        &self.0
    }
}

impl Default for RankOrder {
    fn default() -> Self {
        RankOrder::full()
    }
}

impl FromStr for RankOrder {
    type Err = DashboardError;

    /// Accepts `"D,K,P,G,S"`, `"D K P"` or the compact `"DKPCOFGS"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let codes: Vec<RankCode> = if trimmed.contains(',') || trimmed.contains(char::is_whitespace) {
            trimmed
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(RankCode::parse)
                .collect()
        } else {
            trimmed.chars().map(|c| RankCode::parse(&c.to_string())).collect()
        };

        RankOrder::new(codes).map_err(|_| DashboardError::InvalidRankOrder(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!(RankCode::parse("G"), RankCode::Genus);
        assert_eq!(RankCode::parse(" S "), RankCode::Species);
        assert_eq!(RankCode::parse("S1"), RankCode::Other("S1".into()));
        assert!(RankCode::parse("U").is_root_marker());
        assert!(RankCode::parse("R").is_root_marker());
        assert!(!RankCode::parse("R1").is_root_marker());
    }

    #[test]
    fn test_absent_rank_is_deepest() {
        let order: RankOrder = "G,S".parse().unwrap();
        assert_eq!(order.level(&RankCode::Genus), 0);
        assert_eq!(order.level(&RankCode::Species), 1);
        assert_eq!(order.level(&RankCode::Family), 2);
        assert_eq!(order.level(&RankCode::Other("S1".into())), 2);
    }

    #[test]
    fn test_compact_and_listed_forms_agree() {
        let compact: RankOrder = "DKPCOFGS".parse().unwrap();
        let listed: RankOrder = "D, K, P, C, O, F, G, S".parse().unwrap();
        assert_eq!(compact, listed);
        assert_eq!(compact, RankOrder::full());
    }

    #[test]
    fn test_invalid_orders() {
        assert!("".parse::<RankOrder>().is_err());
        assert!("G,G".parse::<RankOrder>().is_err());
    }

    #[test]
    fn test_serde_as_code() {
        let json = serde_json::to_string(&RankCode::Genus).unwrap();
        assert_eq!(json, "\"G\"");
        let back: RankCode = serde_json::from_str("\"S2\"").unwrap();
        assert_eq!(back, RankCode::Other("S2".into()));
    }
}
