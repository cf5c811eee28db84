//! Session state over the pure filter and aggregation engines.
//!
//! `Dashboard` is the library entry point for an interactive front end, and
//! the `aggregate` command runs through it as a one-shot session. It owns the
//! loaded records and the user's choices, and recomputes the series only when
//! one of its inputs actually changed.

use crate::aggregate::{aggregate_with_report, AggregatedPoint, AggregationReport, MeasureSpec, Window};
use crate::summary::{summarize, SeriesSummary};
use blast_core::error::SourceError;
use blast_core::filter::{apply_filter, resolve_options, Dimension, FilterOptions, FilterSelection};
use blast_core::record::BlastRecord;
use blast_core::source::parse_upload;
use log::{info, warn};

#[derive(Debug, Clone, PartialEq)]
struct SeriesKey {
    generation: u64,
    selection: FilterSelection,
    window: Window,
    specs: Vec<MeasureSpec>,
}

#[derive(Debug)]
struct CachedSeries {
    key: SeriesKey,
    points: Vec<AggregatedPoint>,
    report: AggregationReport,
}

#[derive(Debug)]
pub struct Dashboard {
    records: Vec<BlastRecord>,
    /// Bumped whenever `records` is replaced; stands in for record-set identity.
    generation: u64,
    selection: FilterSelection,
    window: Window,
    specs: Vec<MeasureSpec>,
    cache: Option<CachedSeries>,
    recomputations: usize,
}

impl Dashboard {
    pub fn new(window: Window, specs: Vec<MeasureSpec>) -> Self {
        Self {
            records: Vec::new(),
            generation: 0,
            selection: FilterSelection::new(),
            window,
            specs,
            cache: None,
            recomputations: 0,
        }
    }

    pub fn records(&self) -> &[BlastRecord] {
        &self.records
    }

    /// Swap in a new record set. The selection is cleared since its values
    /// may not exist in the new data.
    pub fn replace_records(&mut self, records: Vec<BlastRecord>) {
        self.records = records;
        self.generation += 1;
        self.selection = FilterSelection::new();
    }

    /// Load an uploaded CSV. On failure the current records stay in place.
    pub fn load_upload(&mut self, text: &str) -> Result<usize, SourceError> {
        match parse_upload(text) {
            Ok(records) => {
                let count = records.len();
                self.replace_records(records);
                info!("dashboard: loaded {} records from upload", count);
                Ok(count)
            }
            Err(e) => {
                warn!(
                    "dashboard: upload rejected, keeping {} existing records: {}",
                    self.records.len(),
                    e
                );
                Err(e)
            }
        }
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn select(&mut self, dimension: Dimension, value: impl Into<String>) {
        self.selection.select(dimension, value);
    }

    /// Replace the whole selection at once.
    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
    }

    pub fn clear(&mut self, dimension: Dimension) {
        self.selection.clear(dimension);
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn set_window(&mut self, window: Window) {
        self.window = window;
    }

    pub fn specs(&self) -> &[MeasureSpec] {
        &self.specs
    }

    pub fn set_specs(&mut self, specs: Vec<MeasureSpec>) {
        self.specs = specs;
    }

    pub fn options(&self) -> FilterOptions {
        resolve_options(&self.records, &self.selection)
    }

    pub fn filtered(&self) -> Vec<BlastRecord> {
        apply_filter(&self.records, &self.selection)
    }

    fn computed(&mut self) -> &CachedSeries {
        let key = SeriesKey {
            generation: self.generation,
            selection: self.selection.clone(),
            window: self.window,
            specs: self.specs.clone(),
        };
        if self.cache.as_ref().is_some_and(|c| c.key != key) {
            self.cache = None;
        }
        let recomputations = &mut self.recomputations;
        let (records, selection, window, specs) =
            (&self.records, &self.selection, &self.window, &self.specs);
        self.cache.get_or_insert_with(|| {
            *recomputations += 1;
            let filtered = apply_filter(records, selection);
            let (points, report) = aggregate_with_report(&filtered, window, specs);
            CachedSeries {
                key,
                points,
                report,
            }
        })
    }

    /// The current series, recomputed only if the inputs changed.
    pub fn series(&mut self) -> &[AggregatedPoint] {
        &self.computed().points
    }

    pub fn report(&mut self) -> AggregationReport {
        self.computed().report
    }

    pub fn summary(&mut self) -> SeriesSummary {
        let specs = self.specs.clone();
        summarize(&self.computed().points, &specs)
    }

    /// How many times the series has actually been computed.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}
