//! Runtime configuration
//!
//! `ServerConfig` comes from environment variables; `GraphQuery` is the
//! query-string form of [`GraphOptions`].

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::taxonomy::{AbsentRankPolicy, GraphOptions, RankCode, RankOrder, ReadsOrder, WeightMode};

pub const DEFAULT_PORT: u16 = 8052;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 1800;
pub const DEFAULT_MAX_SESSIONS: u64 = 1000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub session_ttl: Duration,
    pub max_sessions: u64,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: DEFAULT_PORT,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        ServerConfig {
            port: parse_or("PORT", lookup("PORT"), DEFAULT_PORT),
            session_ttl: Duration::from_secs(parse_or(
                "SESSION_TTL_SECS",
                lookup("SESSION_TTL_SECS"),
                DEFAULT_SESSION_TTL_SECS,
            )),
            max_sessions: parse_or("MAX_SESSIONS", lookup("MAX_SESSIONS"), DEFAULT_MAX_SESSIONS),
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                lookup("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            ),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match raw {
        None => default,
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!("Invalid {}='{}', using default {}", key, value, default);
                default
            }
        },
    }
}

/// Query parameters accepted by the Kraken chart endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GraphQuery {
    pub min_reads: Option<u64>,
    pub rank_filter: Option<String>,
    pub rank_order: Option<String>,
    pub absent_rank: Option<AbsentRankPolicy>,
    pub sort: Option<ReadsOrder>,
    pub weight: Option<WeightMode>,
    pub log_scale: Option<f64>,
    pub name_filter: Option<String>,
}

impl GraphQuery {
    /// Fails only on an unparseable `rank_order`.
    pub fn to_options(&self) -> Result<GraphOptions> {
        let defaults = GraphOptions::default();

        let rank_order = match self.rank_order.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => RankOrder::from_str(raw)?,
            _ => defaults.rank_order,
        };

        let non_blank = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(GraphOptions {
            min_reads: self.min_reads.unwrap_or(defaults.min_reads),
            rank_filter: non_blank(&self.rank_filter).map(|r| RankCode::parse(&r)),
            rank_order,
            absent_rank: self.absent_rank.unwrap_or(defaults.absent_rank),
            sort: self.sort.unwrap_or(defaults.sort),
            weight: self.weight.unwrap_or(defaults.weight),
            log_scale: self.log_scale.unwrap_or(defaults.log_scale),
            name_filter: non_blank(&self.name_filter),
        })
    }
}
