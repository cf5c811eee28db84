//! `aggregate`: filter, bucket and summarize records for charting.

use crate::args::{SourceArgs, WindowArgs};
use anyhow::{bail, Context};
use blast_core::filter::FilterSelection;
use blast_core::record::BlastRecord;
use blast_data::aggregate::{
    aggregate_by_year, AggregatedPoint, AggregationReport, MeasureSpec, Window,
};
use blast_data::dashboard::Dashboard;
use blast_data::export::write_points_csv;
use blast_data::summary::{summarize, SeriesSummary};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// Everything a chart needs for one aggregation.
#[derive(Debug, Serialize)]
pub struct AggregateOutput {
    pub window: Window,
    pub specs: Vec<MeasureSpec>,
    pub points: Vec<AggregatedPoint>,
    pub summary: SeriesSummary,
    pub report: AggregationReport,
}

/// Filter `records` by `selection`, then aggregate over `window`.
///
/// With `per_year` set (yearly windows only) each point covers a whole year.
pub fn aggregate_records(
    records: Vec<BlastRecord>,
    selection: FilterSelection,
    window: Window,
    specs: Vec<MeasureSpec>,
    per_year: bool,
) -> anyhow::Result<AggregateOutput> {
    let mut dashboard = Dashboard::new(window, specs);
    dashboard.replace_records(records);
    dashboard.set_selection(selection);

    let report = dashboard.report();
    let (points, summary) = if per_year {
        let Window::Yearly {
            start_year,
            end_year,
        } = window
        else {
            bail!("--per-year only applies to --mode yearly");
        };
        let points =
            aggregate_by_year(&dashboard.filtered(), start_year, end_year, dashboard.specs());
        let summary = summarize(&points, dashboard.specs());
        (points, summary)
    } else {
        (dashboard.series().to_vec(), dashboard.summary())
    };
    Ok(AggregateOutput {
        window,
        specs: dashboard.specs().to_vec(),
        points,
        summary,
        report,
    })
}

pub async fn run_aggregate(
    source: &SourceArgs,
    window_args: &WindowArgs,
    per_year: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let window = window_args.window()?;
    let records = source.load_records().await?;
    let result = aggregate_records(
        records,
        source.selection(),
        window,
        window_args.specs(),
        per_year,
    )?;
    info!(
        "Aggregated {} of {} records into {} points",
        result.report.aggregated,
        result.report.total,
        result.points.len()
    );

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_points_csv(file, &result.specs, &result.points)?;
            info!("Wrote {} points to {}", result.points.len(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blast_core::filter::Dimension;
    use blast_core::record::Measure;
    use blast_core::source::parse_upload;

    const UPLOAD: &str = "\
date,mine_name,pit_name,total_cost,fly_rock,cost_per_ton
01-01-2024,North,P1,100,10,2
15-01-2024,North,P1,200,20,4
03/02/2024,North,P2,300,30,6
05-06-2023,South,P3,50,5,1
bad,North,P1,100,1,1
";

    #[test]
    fn test_aggregate_records_yearly() {
        let records = parse_upload(UPLOAD).unwrap();
        let mut selection = FilterSelection::new();
        selection.select(Dimension::Mine, "North");
        let specs = vec![
            MeasureSpec::mean(Measure::CostPerTon),
            MeasureSpec::sum(Measure::FlyRock),
        ];
        let window = Window::Yearly {
            start_year: 2024,
            end_year: 2024,
        };
        let output = aggregate_records(records, selection, window, specs, false).unwrap();
        assert_eq!(output.points.len(), 2);
        assert_eq!(output.points[0].value(Measure::CostPerTon), Some(3.0));
        assert_eq!(output.points[0].value(Measure::FlyRock), Some(30.0));
        assert_eq!(output.points[1].label, "Mar 2024");
        assert_eq!(output.report.total, 4);
        assert_eq!(output.report.invalid_date, 1);
        assert_eq!(output.summary.records, 3);
    }

    #[test]
    fn test_aggregate_records_per_year() {
        let records = parse_upload(UPLOAD).unwrap();
        let window = Window::Yearly {
            start_year: 2023,
            end_year: 2024,
        };
        let specs = vec![MeasureSpec::sum(Measure::TotalCost)];
        let output =
            aggregate_records(records, FilterSelection::new(), window, specs, true).unwrap();
        let labels: Vec<&str> = output.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2023", "2024"]);
        assert_eq!(output.points[1].value(Measure::TotalCost), Some(600.0));
    }

    #[test]
    fn test_per_year_needs_yearly_window() {
        let result = aggregate_records(
            Vec::new(),
            FilterSelection::new(),
            Window::unbounded(),
            vec![MeasureSpec::mean(Measure::Ppv)],
            true,
        );
        assert!(result.is_err());
    }
}
