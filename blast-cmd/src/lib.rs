//! Command implementations for the blast analytics CLI.
//!
//! Provides subcommands for listing filter options, aggregating records
//! into chart-ready series, and exporting filtered records.

use clap::Subcommand;
use std::path::PathBuf;

pub mod aggregate;
pub mod args;
pub mod export;
pub mod options;

use args::{SourceArgs, WindowArgs};

#[derive(Subcommand)]
pub enum Command {
    /// List the valid choices for each filter dimension
    Options {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Aggregate records into a daily, monthly or yearly series
    Aggregate {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        window: WindowArgs,

        /// With --mode yearly, emit one point per year instead of per month
        #[arg(long)]
        per_year: bool,

        /// Write the series as CSV instead of printing JSON
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Export the filtered records as CSV
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output path for the records CSV
        #[arg(short = 'o', long)]
        output: PathBuf,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Options { source } => options::run_options(&source).await,
        Command::Aggregate {
            source,
            window,
            per_year,
            output,
        } => aggregate::run_aggregate(&source, &window, per_year, output.as_deref()).await,
        Command::Export { source, output } => export::run_export(&source, &output).await,
    }
}
