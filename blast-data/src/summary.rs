//! Summary scalars shown next to a chart: totals, averages and extremes per
//! measure over an aggregated series.

use crate::aggregate::{AggregatedPoint, MeasureSpec};
use blast_core::record::Measure;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureSummary {
    pub measure: Measure,
    /// Sum of the non-null point values.
    pub total: Option<f64>,
    /// Mean of the non-null point values.
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub points: usize,
    /// Records behind the series (sum of point counts).
    pub records: usize,
    pub measures: Vec<MeasureSummary>,
}

/// Summarize a series. Point values pair with `specs` by position. Points whose value is null for a measure are skipped
/// for that measure; a measure with no values at all has every scalar `None`.
pub fn summarize(points: &[AggregatedPoint], specs: &[MeasureSpec]) -> SeriesSummary {
    let measures = specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let values: Vec<f64> = points
                .iter()
                .filter_map(|p| p.value_at(index))
                .collect();
            if values.is_empty() {
                return MeasureSummary {
                    measure: spec.measure,
                    total: None,
                    average: None,
                    min: None,
                    max: None,
                };
            }
            let total: f64 = values.iter().sum();
            MeasureSummary {
                measure: spec.measure,
                total: Some(total),
                average: Some(total / values.len() as f64),
                min: values.iter().copied().reduce(f64::min),
                max: values.iter().copied().reduce(f64::max),
            }
        })
        .collect();
    SeriesSummary {
        points: points.len(),
        records: points.iter().map(|p| p.count).sum(),
        measures,
    }
}
