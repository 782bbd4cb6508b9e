//! Tagged cell values
//!
//! Spreadsheet cells arrive as numbers, text or nothing at all, and the same
//! column frequently mixes the three. Every consumer goes through the coercion
//! rules here instead of guessing at types:
//!
//! - `Number` coerces to itself unless it is NaN (NaN counts as missing)
//! - `Text` coerces to a number only if the trimmed text parses as `f64`
//! - `Missing` never coerces

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Build a text cell; blank text becomes `Missing`.
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Cell::Missing
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn from_number(value: f64) -> Self {
        if value.is_nan() {
            Cell::Missing
        } else {
            Cell::Number(value)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing) || matches!(self, Cell::Number(n) if n.is_nan())
    }

    /// Numeric view of the cell, `None` when it cannot be coerced.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if !n.is_nan() => Some(*n),
            Cell::Number(_) => None,
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            Cell::Missing => None,
        }
    }

    /// Textual view used for regex matching and category keys.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Number(n) if n.is_nan() => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers print without a trailing ".0" so that sample IDs
            // stored as numbers read the same as their text form.
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Missing => Ok(()),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::from_number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from_text(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Missing, Cell::from_number)
    }
}
