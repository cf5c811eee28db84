//! Time-bucket aggregation of blast records into chart-ready series.
//!
//! A record is eligible when its date normalizes and its total cost is
//! strictly positive. Each configured measure is then aggregated on its own:
//! missing, zero and non-finite values are left out of that measure only.

use blast_core::record::{BlastRecord, Measure};
use blast_utils::dates::{day_label, month_key, month_label, year_label};
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a measure's contributing values are combined inside a bucket.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    /// Arithmetic mean: representative values such as cost per ton.
    #[default]
    Mean,
    /// Sum: cumulative values such as fly-rock incidents over a year.
    Sum,
}

impl AggregationPolicy {
    fn combine(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        match self {
            AggregationPolicy::Mean => Some(sum / values.len() as f64),
            AggregationPolicy::Sum => Some(sum),
        }
    }
}

impl FromStr for AggregationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" | "avg" | "average" => Ok(AggregationPolicy::Mean),
            "sum" | "total" => Ok(AggregationPolicy::Sum),
            other => Err(format!("unknown aggregation policy: {}", other)),
        }
    }
}

/// A measure together with its aggregation policy.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct MeasureSpec {
    pub measure: Measure,
    pub policy: AggregationPolicy,
}

impl MeasureSpec {
    pub fn mean(measure: Measure) -> Self {
        MeasureSpec {
            measure,
            policy: AggregationPolicy::Mean,
        }
    }

    pub fn sum(measure: Measure) -> Self {
        MeasureSpec {
            measure,
            policy: AggregationPolicy::Sum,
        }
    }
}

/// Parses `measure` or `measure=policy`, e.g. `fly_rock=sum`.
impl FromStr for MeasureSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (measure, policy) = match s.split_once('=') {
            Some((measure, policy)) => (measure, policy.parse()?),
            None => (s, AggregationPolicy::default()),
        };
        Ok(MeasureSpec {
            measure: measure.parse()?,
            policy,
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Monthly,
    Yearly,
}

/// The date window of an aggregation. The variant selects the granularity.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Window {
    /// One point per record between `start` and `end` inclusive; a missing
    /// bound leaves that side open.
    Daily {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// One point per day of the given month.
    Monthly { year: i32, month: u32 },
    /// One point per month of the inclusive year range.
    Yearly { start_year: i32, end_year: i32 },
}

impl Window {
    /// A daily window with no bounds.
    pub fn unbounded() -> Self {
        Window::Daily {
            start: None,
            end: None,
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Window::Daily { .. } => Granularity::Daily,
            Window::Monthly { .. } => Granularity::Monthly,
            Window::Yearly { .. } => Granularity::Yearly,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Window::Daily { start, end } => {
                date >= start.unwrap_or(NaiveDate::MIN) && date <= end.unwrap_or(NaiveDate::MAX)
            }
            Window::Monthly { year, month } => date.year() == year && date.month() == month,
            Window::Yearly {
                start_year,
                end_year,
            } => (start_year..=end_year).contains(&date.year()),
        }
    }

    /// The bucket a date falls into under this window's granularity.
    pub fn bucket_key(&self, date: NaiveDate) -> BucketKey {
        match self {
            Window::Daily { .. } | Window::Monthly { .. } => BucketKey::Day(date),
            Window::Yearly { .. } => BucketKey::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }
}

/// Canonical, sortable identity of a bucket.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize)]
#[serde(into = "String")]
pub enum BucketKey {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    Year(i32),
}

impl BucketKey {
    /// Human-readable label for charts, distinct from the sortable key.
    pub fn label(&self) -> String {
        match self {
            BucketKey::Day(date) => day_label(date),
            BucketKey::Month { year, month } => month_label(*year, *month),
            BucketKey::Year(year) => year_label(*year),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            BucketKey::Month { year, month } => f.write_str(&month_key(*year, *month)),
            BucketKey::Year(year) => write!(f, "{}", year),
        }
    }
}

impl From<BucketKey> for String {
    fn from(value: BucketKey) -> Self {
        value.to_string()
    }
}

/// The aggregate of one measure in one bucket; `None` when no record
/// contributed a usable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureValue {
    pub measure: Measure,
    pub value: Option<f64>,
}

/// One entry of an output series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPoint {
    pub key: BucketKey,
    pub label: String,
    /// One entry per configured measure, in configuration order.
    pub values: Vec<MeasureValue>,
    /// Number of eligible records in the bucket.
    pub count: usize,
}

impl AggregatedPoint {
    /// Value of the first configured spec for `measure`.
    pub fn value(&self, measure: Measure) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.measure == measure)
            .and_then(|v| v.value)
    }

    /// Value of the spec at `index` in configuration order.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|v| v.value)
    }
}

/// Where the input records went during an aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    pub total: usize,
    pub invalid_date: usize,
    pub missing_cost: usize,
    pub outside_window: usize,
    pub aggregated: usize,
}

/// A measure value usable for aggregation: present, finite and non-zero.
fn usable_value(record: &BlastRecord, measure: Measure) -> Option<f64> {
    record
        .measure(measure)
        .filter(|v| v.is_finite() && *v != 0.0)
}

/// The record's date if it may be aggregated at all.
fn eligible_date(record: &BlastRecord, report: &mut AggregationReport) -> Option<NaiveDate> {
    let Some(date) = record.parsed_date() else {
        report.invalid_date += 1;
        return None;
    };
    match record.total_cost {
        Some(cost) if cost > 0.0 => Some(date),
        _ => {
            report.missing_cost += 1;
            None
        }
    }
}

fn select_rows<'a>(
    records: &'a [BlastRecord],
    in_window: impl Fn(NaiveDate) -> bool,
) -> (Vec<(NaiveDate, &'a BlastRecord)>, AggregationReport) {
    let mut report = AggregationReport {
        total: records.len(),
        ..Default::default()
    };
    let mut rows = Vec::new();
    for record in records {
        let Some(date) = eligible_date(record, &mut report) else {
            continue;
        };
        if !in_window(date) {
            report.outside_window += 1;
            continue;
        }
        rows.push((date, record));
    }
    report.aggregated = rows.len();
    (rows, report)
}

fn group_into_buckets(
    rows: &[(NaiveDate, &BlastRecord)],
    key_of: impl Fn(NaiveDate) -> BucketKey,
    specs: &[MeasureSpec],
) -> Vec<AggregatedPoint> {
    let mut buckets: BTreeMap<BucketKey, Vec<&BlastRecord>> = BTreeMap::new();
    for (date, record) in rows {
        buckets.entry(key_of(*date)).or_default().push(*record);
    }
    buckets
        .into_iter()
        .map(|(key, members)| {
            let values = specs
                .iter()
                .map(|spec| {
                    let contributing: Vec<f64> = members
                        .iter()
                        .filter_map(|r| usable_value(r, spec.measure))
                        .collect();
                    MeasureValue {
                        measure: spec.measure,
                        value: spec.policy.combine(&contributing),
                    }
                })
                .collect();
            AggregatedPoint {
                key,
                label: key.label(),
                values,
                count: members.len(),
            }
        })
        .collect()
}

/// Aggregate `records` over `window`, one value per entry of `specs`.
pub fn aggregate(
    records: &[BlastRecord],
    window: &Window,
    specs: &[MeasureSpec],
) -> Vec<AggregatedPoint> {
    aggregate_with_report(records, window, specs).0
}

/// Same as [`aggregate`], also reporting how many records were excluded and why.
pub fn aggregate_with_report(
    records: &[BlastRecord],
    window: &Window,
    specs: &[MeasureSpec],
) -> (Vec<AggregatedPoint>, AggregationReport) {
    let (mut rows, report) = select_rows(records, |date| window.contains(date));
    let points = match window.granularity() {
        Granularity::Daily => {
            // Stable: records on the same day keep their input order.
            rows.sort_by_key(|(date, _)| *date);
            rows.iter()
                .map(|(date, record)| {
                    let key = BucketKey::Day(*date);
                    AggregatedPoint {
                        key,
                        label: key.label(),
                        values: specs
                            .iter()
                            .map(|spec| MeasureValue {
                                measure: spec.measure,
                                value: usable_value(record, spec.measure),
                            })
                            .collect(),
                        count: 1,
                    }
                })
                .collect()
        }
        Granularity::Monthly | Granularity::Yearly => {
            group_into_buckets(&rows, |date| window.bucket_key(date), specs)
        }
    };
    debug!(
        "aggregate: {} points from {} records ({} bad date, {} no cost, {} outside window)",
        points.len(),
        report.total,
        report.invalid_date,
        report.missing_cost,
        report.outside_window
    );
    (points, report)
}

/// One point per calendar year in `[start_year, end_year]`, for comparing
/// whole years side by side.
pub fn aggregate_by_year(
    records: &[BlastRecord],
    start_year: i32,
    end_year: i32,
    specs: &[MeasureSpec],
) -> Vec<AggregatedPoint> {
    let (rows, _) = select_rows(records, |date| (start_year..=end_year).contains(&date.year()));
    group_into_buckets(&rows, |date| BucketKey::Year(date.year()), specs)
}
