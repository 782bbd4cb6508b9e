//! Qualitative colour palettes and deterministic category colouring.

use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Bar charts over sheet columns
    Vivid,
    /// Sankey nodes
    Set2,
    /// Top-taxa stacked bars
    Bold,
}

const VIVID: [&str; 11] = [
    "rgb(229, 134, 6)",
    "rgb(93, 105, 177)",
    "rgb(82, 188, 163)",
    "rgb(153, 201, 69)",
    "rgb(204, 97, 176)",
    "rgb(36, 121, 108)",
    "rgb(218, 165, 27)",
    "rgb(47, 138, 196)",
    "rgb(118, 78, 159)",
    "rgb(237, 100, 90)",
    "rgb(165, 170, 153)",
];

const SET2: [&str; 8] = [
    "rgb(102,194,165)",
    "rgb(252,141,98)",
    "rgb(141,160,203)",
    "rgb(231,138,195)",
    "rgb(166,216,84)",
    "rgb(255,217,47)",
    "rgb(229,196,148)",
    "rgb(179,179,179)",
];

const BOLD: [&str; 11] = [
    "rgb(127, 60, 141)",
    "rgb(17, 165, 121)",
    "rgb(57, 105, 172)",
    "rgb(242, 183, 1)",
    "rgb(231, 63, 116)",
    "rgb(128, 186, 90)",
    "rgb(230, 131, 16)",
    "rgb(0, 134, 149)",
    "rgb(207, 28, 144)",
    "rgb(249, 123, 114)",
    "rgb(165, 170, 153)",
];

impl Palette {
    pub fn colors(self) -> &'static [&'static str] {
        match self {
            Palette::Vivid => &VIVID,
            Palette::Set2 => &SET2,
            Palette::Bold => &BOLD,
        }
    }

    /// Colour for the `index`-th item, cycling once the palette runs out.
    pub fn color(self, index: usize) -> &'static str {
        let colors = self.colors();
        colors[index % colors.len()]
    }
}

/// Category → colour assignment in first-encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    entries: Vec<(String, &'static str)>,
    index: FxHashMap<String, usize>,
}

impl ColorMap {
    pub fn get(&self, category: &str) -> Option<&'static str> {
        self.index.get(category).map(|&i| self.entries[i].1)
    }

    pub fn entries(&self) -> &[(String, &'static str)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ColorMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

/// Assign each distinct category the next palette colour, cycling on overflow.
pub fn build_color_map<I, S>(categories: I, palette: Palette) -> ColorMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();
    let mut index = FxHashMap::default();

    for category in categories {
        let category = category.as_ref();
        if index.contains_key(category) {
            continue;
        }
        let color = palette.color(entries.len());
        index.insert(category.to_string(), entries.len());
        entries.push((category.to_string(), color));
    }

    ColorMap { entries, index }
}
