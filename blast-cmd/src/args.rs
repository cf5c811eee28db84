//! Arguments shared by the subcommands: where records come from, how they
//! are narrowed, and which window/measures an aggregation uses.

use anyhow::{bail, Context};
use blast_core::filter::{Dimension, FilterSelection};
use blast_core::record::BlastRecord;
use blast_core::source::{fetch_records, read_upload};
use blast_data::aggregate::{MeasureSpec, Window};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use log::info;
use std::path::PathBuf;

/// Seconds before a feed request is abandoned.
const FETCH_TIMEOUT_SECS: u64 = 60;

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Uploaded CSV file (first line holds the headers)
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    pub csv: Option<PathBuf>,

    /// JSON feed endpoint returning `{ "data": [...] }`
    #[arg(long)]
    pub url: Option<String>,

    /// Mine name to drill into
    #[arg(long)]
    pub mine: Option<String>,

    /// Pit name within the mine
    #[arg(long)]
    pub pit: Option<String>,

    /// Zone name within the pit
    #[arg(long)]
    pub zone: Option<String>,

    /// Bench name within the zone
    #[arg(long)]
    pub bench: Option<String>,

    /// Rock type within the bench
    #[arg(long)]
    pub rock: Option<String>,
}

impl SourceArgs {
    /// The selection described by the flags, applied in hierarchy order.
    pub fn selection(&self) -> FilterSelection {
        let mut selection = FilterSelection::new();
        let flags = [
            (Dimension::Mine, &self.mine),
            (Dimension::Pit, &self.pit),
            (Dimension::Zone, &self.zone),
            (Dimension::Bench, &self.bench),
            (Dimension::Rock, &self.rock),
        ];
        for (dimension, value) in flags {
            if let Some(value) = value {
                selection.select(dimension, value.as_str());
            }
        }
        selection
    }

    /// Load records from the upload or the feed.
    ///
    /// A rejected upload is an error. A failed fetch is not: it logs a
    /// warning and yields no records.
    pub async fn load_records(&self) -> anyhow::Result<Vec<BlastRecord>> {
        if let Some(path) = &self.csv {
            let records = read_upload(path)
                .with_context(|| format!("Failed to load upload {}", path.display()))?;
            info!("Loaded {} records from {}", records.len(), path.display());
            return Ok(records);
        }
        if let Some(url) = &self.url {
            let client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()?;
            let records = fetch_records(&client, url).await;
            info!("Fetched {} records from {}", records.len(), url);
            return Ok(records);
        }
        bail!("either --csv or --url is required")
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One point per blast
    Daily,
    /// One point per day of a month
    Monthly,
    /// One point per month of a year range
    Yearly,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    blast_utils::dates::parse_date(s).map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Granularity of the output series
    #[arg(long, value_enum, default_value_t = Mode::Daily)]
    pub mode: Mode,

    /// First day of a daily series (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// Last day of a daily series (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,

    /// Year of a monthly series
    #[arg(long)]
    pub year: Option<i32>,

    /// Month (1-12) of a monthly series
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// First year of a yearly series
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year of a yearly series (defaults to --start-year)
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Measure to aggregate, optionally with a policy: `fly_rock=sum`.
    /// Repeat for several measures.
    #[arg(long = "measure", default_value = "cost_per_ton=mean")]
    pub measures: Vec<MeasureSpec>,
}

impl WindowArgs {
    pub fn window(&self) -> anyhow::Result<Window> {
        match self.mode {
            Mode::Daily => {
                if let (Some(start), Some(end)) = (self.start, self.end) {
                    if start > end {
                        bail!("--start {} is after --end {}", start, end);
                    }
                }
                Ok(Window::Daily {
                    start: self.start,
                    end: self.end,
                })
            }
            Mode::Monthly => {
                let (Some(year), Some(month)) = (self.year, self.month) else {
                    bail!("--mode monthly needs --year and --month");
                };
                Ok(Window::Monthly { year, month })
            }
            Mode::Yearly => {
                let Some(start_year) = self.start_year else {
                    bail!("--mode yearly needs --start-year");
                };
                let end_year = self.end_year.unwrap_or(start_year);
                if start_year > end_year {
                    bail!("--start-year {} is after --end-year {}", start_year, end_year);
                }
                Ok(Window::Yearly {
                    start_year,
                    end_year,
                })
            }
        }
    }

    /// Measures to aggregate, in flag order.
    pub fn specs(&self) -> Vec<MeasureSpec> {
        self.measures.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blast_core::record::Measure;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        window: WindowArgs,
    }

    fn parse(args: &[&str]) -> TestCli {
        TestCli::try_parse_from(std::iter::once("test").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_selection_from_flags() {
        let cli = parse(&["--csv", "blasts.csv", "--mine", "North", "--zone", "Z1"]);
        let selection = cli.source.selection();
        assert_eq!(selection.get(Dimension::Mine), Some("North"));
        assert_eq!(selection.get(Dimension::Pit), None);
        assert_eq!(selection.get(Dimension::Zone), Some("Z1"));
    }

    #[test]
    fn test_source_is_required() {
        assert!(TestCli::try_parse_from(["test"]).is_err());
        assert!(
            TestCli::try_parse_from(["test", "--csv", "a.csv", "--url", "http://x"]).is_err()
        );
    }

    #[test]
    fn test_windows() {
        let cli = parse(&["--csv", "a.csv", "--mode", "monthly", "--year", "2024", "--month", "3"]);
        assert_eq!(
            cli.window.window().unwrap(),
            Window::Monthly {
                year: 2024,
                month: 3
            }
        );

        let cli = parse(&["--csv", "a.csv", "--mode", "yearly", "--start-year", "2022"]);
        assert_eq!(
            cli.window.window().unwrap(),
            Window::Yearly {
                start_year: 2022,
                end_year: 2022
            }
        );

        let cli = parse(&["--csv", "a.csv", "--start", "2024-01-01"]);
        assert_eq!(
            cli.window.window().unwrap(),
            Window::Daily {
                start: NaiveDate::from_ymd_opt(2024, 1, 1),
                end: None
            }
        );

        let cli = parse(&["--csv", "a.csv", "--mode", "monthly", "--year", "2024"]);
        assert!(cli.window.window().is_err());

        let cli = parse(&[
            "--csv", "a.csv", "--mode", "yearly", "--start-year", "2025", "--end-year", "2024",
        ]);
        assert!(cli.window.window().is_err());

        assert!(TestCli::try_parse_from(["test", "--csv", "a.csv", "--month", "13"]).is_err());
    }

    #[test]
    fn test_measure_flags() {
        let cli = parse(&["--csv", "a.csv"]);
        assert_eq!(cli.window.specs(), vec![MeasureSpec::mean(Measure::CostPerTon)]);

        let cli = parse(&[
            "--csv",
            "a.csv",
            "--measure",
            "total_cost",
            "--measure",
            "fly_rock=sum",
        ]);
        assert_eq!(
            cli.window.specs(),
            vec![
                MeasureSpec::mean(Measure::TotalCost),
                MeasureSpec::sum(Measure::FlyRock)
            ]
        );
        assert!(TestCli::try_parse_from(["test", "--csv", "a.csv", "--measure", "tonnage"]).is_err());
    }
}
