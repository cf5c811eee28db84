//! Cascading filter over the mine → pit → zone → bench → rock hierarchy.
//!
//! Options for a dimension only ever depend on the selections made on the
//! dimensions before it, and changing a selection clears everything after it,
//! so an offered option is always consistent with its ancestors.

use crate::record::BlastRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A level of the classification hierarchy, in drill-down order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Mine,
    Pit,
    Zone,
    Bench,
    Rock,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Mine,
        Dimension::Pit,
        Dimension::Zone,
        Dimension::Bench,
        Dimension::Rock,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The record's value for this dimension; empty text counts as missing.
    pub fn value_of<'a>(&self, record: &'a BlastRecord) -> Option<&'a str> {
        let value = match self {
            Dimension::Mine => record.mine_name.as_deref(),
            Dimension::Pit => record.pit_name.as_deref(),
            Dimension::Zone => record.zone_name.as_deref(),
            Dimension::Bench => record.bench_name.as_deref(),
            Dimension::Rock => record.rock_name.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// The current drill-down state: at most one value per dimension.
#[derive(Debug, PartialEq, Eq, Clone, Default, Hash, Serialize, Deserialize)]
pub struct FilterSelection([Option<String>; 5]);

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.0[dimension.index()].as_deref()
    }

    /// Select `value` at `dimension` and clear every later dimension.
    /// An empty value is the same as clearing.
    pub fn select(&mut self, dimension: Dimension, value: impl Into<String>) {
        let value: String = value.into();
        let index = dimension.index();
        self.0[index] = if value.is_empty() { None } else { Some(value) };
        for later in self.0.iter_mut().skip(index + 1) {
            *later = None;
        }
    }

    /// Clear `dimension` and every later dimension.
    pub fn clear(&mut self, dimension: Dimension) {
        self.select(dimension, String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// True if `record` satisfies every selection before `upto`.
    fn matches_before(&self, record: &BlastRecord, upto: usize) -> bool {
        Dimension::ALL
            .iter()
            .take(upto)
            .all(|dimension| match self.get(*dimension) {
                None => true,
                Some(selected) => dimension.value_of(record) == Some(selected),
            })
    }

    /// True if `record` satisfies every non-empty selection.
    pub fn matches(&self, record: &BlastRecord) -> bool {
        self.matches_before(record, Dimension::ALL.len())
    }
}

/// The valid choices for each dimension given a selection.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub mines: Vec<String>,
    pub pits: Vec<String>,
    pub zones: Vec<String>,
    pub benches: Vec<String>,
    pub rocks: Vec<String>,
}

impl FilterOptions {
    pub fn get(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Mine => &self.mines,
            Dimension::Pit => &self.pits,
            Dimension::Zone => &self.zones,
            Dimension::Bench => &self.benches,
            Dimension::Rock => &self.rocks,
        }
    }

    fn get_mut(&mut self, dimension: Dimension) -> &mut Vec<String> {
        match dimension {
            Dimension::Mine => &mut self.mines,
            Dimension::Pit => &mut self.pits,
            Dimension::Zone => &mut self.zones,
            Dimension::Bench => &mut self.benches,
            Dimension::Rock => &mut self.rocks,
        }
    }
}

/// Compute the options for every dimension.
///
/// Values are listed in order of first appearance in `records`, not sorted,
/// so the option order is reproducible for a given data set.
pub fn resolve_options(records: &[BlastRecord], selection: &FilterSelection) -> FilterOptions {
    let mut options = FilterOptions::default();
    for dimension in Dimension::ALL {
        let mut seen: HashSet<&str> = HashSet::new();
        let values = options.get_mut(dimension);
        for record in records
            .iter()
            .filter(|r| selection.matches_before(r, dimension.index()))
        {
            if let Some(value) = dimension.value_of(record) {
                if seen.insert(value) {
                    values.push(value.to_string());
                }
            }
        }
    }
    options
}

/// Records matching every non-empty selection, in their original order.
pub fn apply_filter(records: &[BlastRecord], selection: &FilterSelection) -> Vec<BlastRecord> {
    records
        .iter()
        .filter(|r| selection.matches(r))
        .cloned()
        .collect()
}
